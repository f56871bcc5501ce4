//! Declining hot updates.
//!
//! Two situations end a refresh cycle without a patch:
//!
//! - gate: the reactive runtime was built without its development
//!   introspection, so proxies cannot render reactively;
//! - inline: a dispose-then-accept patch found a removed registration.
//!
//! What "decline" means differs by flavor and is kept as data in a
//! [`DeclineTable`] rather than derived from a rule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{HotHandle, TransportKind};

/// What to ask the host for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclineStrategy {
    /// Propagate the update to importers.
    Invalidate,
    /// Mark the module as not hot-updatable.
    Decline,
    /// Reload the whole page.
    Reload,
    /// Accept, then invalidate as soon as an update arrives.
    AcceptThenInvalidate,
}

/// Strategies for one flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineRule {
    pub gate: DeclineStrategy,
    pub inline: DeclineStrategy,
}

fn builtin_rule(kind: TransportKind) -> DeclineRule {
    use DeclineStrategy::*;

    match kind {
        TransportKind::Esm => DeclineRule { gate: Decline, inline: Invalidate },
        TransportKind::Vite => DeclineRule { gate: AcceptThenInvalidate, inline: Invalidate },
        TransportKind::Standard => DeclineRule { gate: Decline, inline: Reload },
        TransportKind::Webpack5 | TransportKind::RspackEsm => DeclineRule {
            gate: Decline,
            inline: Invalidate,
        },
    }
}

/// Flavor-to-rule lookup. Flavors missing from the table use the built-in rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclineTable {
    rules: IndexMap<TransportKind, DeclineRule>,
}

impl Default for DeclineTable {
    fn default() -> Self {
        Self {
            rules: TransportKind::ALL.into_iter().map(|kind| (kind, builtin_rule(kind))).collect(),
        }
    }
}

impl DeclineTable {
    /// An empty table: every flavor uses its built-in rule.
    pub fn empty() -> Self {
        Self { rules: IndexMap::new() }
    }

    pub fn rule(&self, kind: TransportKind) -> DeclineRule {
        self.rules.get(&kind).copied().unwrap_or_else(|| builtin_rule(kind))
    }

    pub fn strategy(&self, kind: TransportKind, inline: bool) -> DeclineStrategy {
        let rule = self.rule(kind);
        if inline {
            rule.inline
        } else {
            rule.gate
        }
    }

    pub fn set(&mut self, kind: TransportKind, rule: DeclineRule) {
        self.rules.insert(kind, rule);
    }
}

/// Decline the current cycle the way the table says for `kind`.
pub fn decline(kind: TransportKind, hot: &HotHandle, inline: bool, table: &DeclineTable) {
    let strategy = table.strategy(kind, inline);
    info!(transport = %kind, inline, ?strategy, "declining hot update");

    match strategy {
        DeclineStrategy::Invalidate => hot.invalidate(),
        DeclineStrategy::Decline => hot.decline(),
        DeclineStrategy::Reload => hot.reload_page(),
        DeclineStrategy::AcceptThenInvalidate => match hot {
            HotHandle::Esm(esm) => {
                let weak = Arc::downgrade(esm);
                esm.accept(Box::new(move |_| {
                    if let Some(esm) = weak.upgrade() {
                        esm.invalidate();
                    }
                }));
            }
            // No callback to defer to.
            HotHandle::Standard(standard) => standard.invalidate(),
        },
    }
}

const MISSING_DEV_MODE: &str = "hot component swapping needs the development build of the \
     reactive runtime; enable the `development` export condition in your bundler. \
     Falling back to full reloads.";

/// Warn-once gate for a missing development runtime.
#[derive(Debug, Default)]
pub struct DeclineGate {
    warned: AtomicBool,
}

impl DeclineGate {
    pub const fn new() -> Self {
        Self {
            warned: AtomicBool::new(false),
        }
    }

    /// The process-wide gate.
    pub fn global() -> &'static DeclineGate {
        static GATE: DeclineGate = DeclineGate::new();
        &GATE
    }

    /// Whether reconciliation must be skipped. Warns the first time only.
    pub fn should_decline(&self, dev_mode: bool) -> bool {
        if dev_mode {
            return false;
        }

        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!("{}", MISSING_DEV_MODE);
        }
        true
    }

    pub fn has_warned(&self) -> bool {
        self.warned.load(Ordering::SeqCst)
    }
}
