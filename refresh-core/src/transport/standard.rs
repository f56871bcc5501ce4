//! Dispose-then-accept adapter (`standard`, `webpack5`, `rspack-esm`).

use std::sync::Arc;

use tracing::debug;

use super::{decline, DeclineGate, HotHandle, StandardHot, REGISTRY_CURRENT};
use crate::config::RefreshConfig;
use crate::patch::reconcile_with_report;
use crate::registry::{Registry, SharedRegistry};

/// Register a module evaluation with a dispose-then-accept host.
///
/// The new instance patches itself into the registry its predecessor stored
/// at dispose time. That canonical registry, or this evaluation's registry on
/// the first load, is what this instance stores when it is disposed in turn.
pub fn refresh_standard(
    config: &RefreshConfig,
    gate: &DeclineGate,
    hot: Arc<dyn StandardHot>,
    registry: Registry,
) {
    let kind = config.transport;

    if gate.should_decline(config.dev_mode) {
        decline(kind, &HotHandle::Standard(hot), false, &config.decline);
        return;
    }

    let canonical = hot.data().and_then(|data| data.current());

    if let Some(canonical) = &canonical {
        let report = reconcile_with_report(&mut canonical.lock(), &registry);
        debug!(
            transport = %kind,
            swapped = report.swapped.len(),
            added = report.added.len(),
            "patched into persisted registry"
        );
        if report.must_reload() {
            decline(kind, &HotHandle::Standard(hot.clone()), true, &config.decline);
        }
    }

    let persisted = canonical.unwrap_or_else(|| SharedRegistry::new(registry));
    hot.dispose(Box::new(move |data| data.insert(REGISTRY_CURRENT, persisted)));
    hot.accept();
}
