//! Transport Adapters
//!
//! Glue between the patch engine and a dev server's hot-reload API. The
//! engine itself only knows registries; this module knows where the previous
//! registry is stored between reloads and how to ask the host for a full
//! reload.
//!
//! # Shapes
//!
//! - Accept-with-new-module (`esm`, `vite`): the hot object and its data
//!   persist across module versions. The first registry becomes canonical,
//!   every later one is stored as "previous", and an accept callback patches
//!   previous into canonical when the host delivers the new module.
//! - Dispose-then-accept (`standard`, `webpack5`, `rspack-esm`): the old
//!   instance stores the canonical registry at dispose time; the new instance
//!   finds it in its hot data and patches itself into it on evaluation.
//!
//! The flavor is picked once, in [`refresh`].

mod decline;
mod esm;
pub mod memory;
mod standard;

pub use decline::{decline, DeclineGate, DeclineRule, DeclineStrategy, DeclineTable};
pub use esm::refresh_esm;
pub use standard::refresh_standard;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::RefreshConfig;
use crate::error::{RefreshError, RefreshResult};
use crate::registry::{Registry, SharedRegistry};

/// Slot holding the canonical registry.
pub const REGISTRY_CURRENT: &str = "registry-current";

/// Slot holding the registry of the latest evaluation (accept-with-new-module only).
pub const REGISTRY_PREVIOUS: &str = "registry-previous";

/// Dev-server flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    Esm,
    Vite,
    Standard,
    Webpack5,
    RspackEsm,
}

/// How a flavor hands over module versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportShape {
    AcceptWithModule,
    DisposeThenAccept,
}

impl TransportShape {
    fn handle_name(self) -> &'static str {
        match self {
            TransportShape::AcceptWithModule => "esm",
            TransportShape::DisposeThenAccept => "standard",
        }
    }
}

impl TransportKind {
    pub const ALL: [TransportKind; 5] = [
        TransportKind::Esm,
        TransportKind::Vite,
        TransportKind::Standard,
        TransportKind::Webpack5,
        TransportKind::RspackEsm,
    ];

    pub fn shape(self) -> TransportShape {
        match self {
            TransportKind::Esm | TransportKind::Vite => TransportShape::AcceptWithModule,
            TransportKind::Standard | TransportKind::Webpack5 | TransportKind::RspackEsm => {
                TransportShape::DisposeThenAccept
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Esm => "esm",
            TransportKind::Vite => "vite",
            TransportKind::Standard => "standard",
            TransportKind::Webpack5 => "webpack5",
            TransportKind::RspackEsm => "rspack-esm",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = RefreshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RefreshError::UnknownTransport(s.to_string()))
    }
}

/// Storage that survives module re-evaluation.
#[derive(Debug, Clone, Default)]
pub struct HotData {
    slots: Arc<DashMap<String, SharedRegistry>>,
}

impl HotData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<SharedRegistry> {
        self.slots.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: &str, registry: SharedRegistry) {
        self.slots.insert(key.to_string(), registry);
    }

    /// Store `registry` unless the slot is taken; returns the slot's value.
    pub fn get_or_insert(&self, key: &str, registry: SharedRegistry) -> SharedRegistry {
        self.slots.entry(key.to_string()).or_insert(registry).value().clone()
    }

    pub fn current(&self) -> Option<SharedRegistry> {
        self.get(REGISTRY_CURRENT)
    }

    pub fn previous(&self) -> Option<SharedRegistry> {
        self.get(REGISTRY_PREVIOUS)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }
}

/// A new module version delivered to an accept callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedModule {
    pub id: String,
}

/// Callback run when the host delivers a new module version; `None` when
/// the new version failed to load.
pub type AcceptCallback = Box<dyn FnMut(Option<AcceptedModule>) + Send>;

/// Callback run when the current module instance is discarded.
pub type DisposeCallback = Box<dyn FnOnce(&HotData) + Send>;

/// Capabilities shared by every host.
pub trait HotModule: Send + Sync {
    /// Persistent storage, if the host provides one for this instance.
    fn data(&self) -> Option<HotData>;

    /// Propagate the update to importers.
    fn invalidate(&self);

    /// Mark the module as not hot-updatable.
    fn decline(&self);

    /// Reload the whole page.
    fn reload_page(&self);
}

/// Accept-with-new-module host.
pub trait EsmHot: HotModule {
    fn accept(&self, callback: AcceptCallback);
}

/// Dispose-then-accept host.
pub trait StandardHot: HotModule {
    fn accept(&self);
    fn dispose(&self, callback: DisposeCallback);
}

/// A host of either shape.
#[derive(Clone)]
pub enum HotHandle {
    Esm(Arc<dyn EsmHot>),
    Standard(Arc<dyn StandardHot>),
}

impl HotHandle {
    pub fn data(&self) -> Option<HotData> {
        match self {
            HotHandle::Esm(hot) => hot.data(),
            HotHandle::Standard(hot) => hot.data(),
        }
    }

    pub fn invalidate(&self) {
        match self {
            HotHandle::Esm(hot) => hot.invalidate(),
            HotHandle::Standard(hot) => hot.invalidate(),
        }
    }

    pub fn decline(&self) {
        match self {
            HotHandle::Esm(hot) => hot.decline(),
            HotHandle::Standard(hot) => hot.decline(),
        }
    }

    pub fn reload_page(&self) {
        match self {
            HotHandle::Esm(hot) => hot.reload_page(),
            HotHandle::Standard(hot) => hot.reload_page(),
        }
    }
}

impl fmt::Debug for HotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotHandle::Esm(_) => f.write_str("HotHandle::Esm"),
            HotHandle::Standard(_) => f.write_str("HotHandle::Standard"),
        }
    }
}

/// Hand a freshly evaluated module's registry to the host.
///
/// Uses the process-wide [`DeclineGate`].
pub fn refresh(config: &RefreshConfig, hot: HotHandle, registry: Registry) -> RefreshResult<()> {
    refresh_with_gate(config, DeclineGate::global(), hot, registry)
}

/// [`refresh`] with an explicit warning gate.
pub fn refresh_with_gate(
    config: &RefreshConfig,
    gate: &DeclineGate,
    hot: HotHandle,
    registry: Registry,
) -> RefreshResult<()> {
    let kind = config.transport;
    match (kind.shape(), hot) {
        (TransportShape::AcceptWithModule, HotHandle::Esm(hot)) => {
            refresh_esm(config, gate, hot, registry);
            Ok(())
        }
        (TransportShape::DisposeThenAccept, HotHandle::Standard(hot)) => {
            refresh_standard(config, gate, hot, registry);
            Ok(())
        }
        (shape, _) => Err(RefreshError::TransportMismatch {
            kind,
            expected: shape.handle_name(),
        }),
    }
}
