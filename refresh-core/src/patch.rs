//! Patch Engine
//!
//! Reconciles the registry of a module's previous evaluation ("old", the
//! canonical registry kept across reloads) with the registry of its latest
//! evaluation ("new").
//!
//! # Components
//!
//! For every id in either registry:
//!
//! - only in old: the component was deleted or renamed. Nothing can take over
//!   its mounted instances, so the module must fully reload.
//! - only in new: adopted into the old registry so later edits see it.
//! - in both: with a signature, swap only when the signature or the
//!   dependency snapshot changed; without one, always swap. A swap points the
//!   old (long-lived) proxy at the new body and records the new signature and
//!   dependencies on the old registration, so the next edit is compared against
//!   what is installed. The new module's own proxy is then pointed at the old
//!   proxy, so there is one true proxy per id.
//!
//! # Contexts
//!
//! Same classification. For ids in both, the new default value is copied onto
//! the old context and the new context takes over the old token and provider.
//! Contexts are patched before components so swapped-in bodies already see
//! aliased contexts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dependencies::dependencies_changed;
use crate::registry::{ComponentRegistration, ContextRegistration, Registry};

/// What one reconciliation did, id by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchReport {
    /// Components whose old proxy now runs the new body.
    pub swapped: Vec<String>,
    /// Components left running their existing body.
    pub unchanged: Vec<String>,
    /// Components adopted from the new registry.
    pub added: Vec<String>,
    /// Components missing from the new registry.
    pub removed: Vec<String>,
    /// Contexts patched in place.
    pub contexts_patched: Vec<String>,
    pub contexts_added: Vec<String>,
    pub contexts_removed: Vec<String>,
}

impl PatchReport {
    /// Whether the module has to be fully reloaded.
    pub fn must_reload(&self) -> bool {
        !self.removed.is_empty() || !self.contexts_removed.is_empty()
    }
}

/// Whether a registration pair needs its body swapped.
fn should_swap(old: &ComponentRegistration, new: &ComponentRegistration) -> bool {
    match new.signature() {
        Some(signature) => {
            old.signature() != Some(signature)
                || dependencies_changed(old.dependencies(), new.dependencies())
        }
        None => true,
    }
}

fn patch_component(
    old: &mut ComponentRegistration,
    new: &ComponentRegistration,
    report: &mut PatchReport,
) {
    if should_swap(old, new) {
        debug!(id = %old.id(), "swapping component body");
        old.adopt_metadata(new);
        old.update(new.component().clone());
        report.swapped.push(old.id().to_string());
    } else {
        debug!(id = %old.id(), "component unchanged");
        report.unchanged.push(old.id().to_string());
    }

    new.update(old.proxy().clone());
}

/// Patch component registrations. Returns true if the module must reload.
///
/// Stops at the first removed id: the reload replaces everything anyway.
pub fn patch_components(
    old: &mut IndexMap<String, ComponentRegistration>,
    new: &IndexMap<String, ComponentRegistration>,
    report: &mut PatchReport,
) -> bool {
    for (id, old_registration) in old.iter_mut() {
        match new.get(id) {
            Some(new_registration) => patch_component(old_registration, new_registration, report),
            None => {
                info!(id = %id, "component removed, full reload required");
                report.removed.push(id.clone());
                return true;
            }
        }
    }

    for (id, new_registration) in new {
        if !old.contains_key(id) {
            debug!(id = %id, "component added");
            old.insert(id.clone(), new_registration.clone());
            report.added.push(id.clone());
        }
    }

    false
}

/// Patch context registrations. Returns true if the module must reload.
pub fn patch_contexts(
    old: &mut IndexMap<String, ContextRegistration>,
    new: &IndexMap<String, ContextRegistration>,
    report: &mut PatchReport,
) -> bool {
    for (id, old_registration) in old.iter() {
        match new.get(id) {
            Some(new_registration) => {
                let (old_context, new_context) =
                    (old_registration.context(), new_registration.context());
                old_context.set_default_value(new_context.default_value());
                new_context.alias_identity(old_context);
                report.contexts_patched.push(id.clone());
            }
            None => {
                info!(id = %id, "context removed, full reload required");
                report.contexts_removed.push(id.clone());
                return true;
            }
        }
    }

    for (id, new_registration) in new {
        if !old.contains_key(id) {
            debug!(id = %id, "context added");
            old.insert(id.clone(), new_registration.clone());
            report.contexts_added.push(id.clone());
        }
    }

    false
}

/// Reconcile `new` into `old`, reporting every decision.
pub fn reconcile_with_report(old: &mut Registry, new: &Registry) -> PatchReport {
    let mut report = PatchReport::default();

    let contexts_reload = patch_contexts(old.contexts_mut(), new.contexts(), &mut report);
    let components_reload = patch_components(old.components_mut(), new.components(), &mut report);

    debug!(
        swapped = report.swapped.len(),
        unchanged = report.unchanged.len(),
        added = report.added.len(),
        must_reload = contexts_reload || components_reload,
        "registry reconciled"
    );

    report
}

/// Reconcile `new` into `old`. Returns true if the module must fully reload.
pub fn reconcile(old: &mut Registry, new: &Registry) -> bool {
    reconcile_with_report(old, new).must_reload()
}
