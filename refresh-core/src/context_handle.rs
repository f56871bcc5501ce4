//! Hot-patchable context values.
//!
//! A context is matched by token, not by handle: a [`Provider`] closes over
//! the token of the context that created it, and [`use_context`] looks the
//! handle's current token up in the provider scope. Patching a context copies
//! the new default forward and points the new handle's token and provider at
//! the old ones, so providers mounted before an edit keep serving consumers
//! evaluated after it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::reactive::{ContextId, Owner};

struct ProviderBinding {
    context_id: ContextId,
}

/// Provides values for one context token.
#[derive(Clone)]
pub struct Provider(Arc<ProviderBinding>);

impl Provider {
    fn new(context_id: ContextId) -> Self {
        Self(Arc::new(ProviderBinding { context_id }))
    }

    /// Token this provider serves.
    pub fn context_id(&self) -> ContextId {
        self.0.context_id
    }

    /// Run `f` with `value` provided to every consumer inside it.
    pub fn provide<R>(&self, value: Value, f: impl FnOnce() -> R) -> R {
        Owner::provide(self.0.context_id, value, f)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("context_id", &self.0.context_id)
            .finish()
    }
}

struct ContextInner {
    id: RwLock<ContextId>,
    provider: RwLock<Provider>,
    default_value: RwLock<Value>,
}

/// Shared handle to a context.
#[derive(Clone)]
pub struct ContextHandle(Arc<ContextInner>);

impl ContextHandle {
    pub fn id(&self) -> ContextId {
        *self.0.id.read()
    }

    pub fn provider(&self) -> Provider {
        self.0.provider.read().clone()
    }

    pub fn default_value(&self) -> Value {
        self.0.default_value.read().clone()
    }

    pub fn set_default_value(&self, value: Value) {
        *self.0.default_value.write() = value;
    }

    /// Take over another handle's token and provider.
    pub fn alias_identity(&self, canonical: &ContextHandle) {
        let (id, provider) = (canonical.id(), canonical.provider());
        *self.0.id.write() = id;
        *self.0.provider.write() = provider;
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("id", &self.id())
            .field("default_value", &self.default_value())
            .finish()
    }
}

/// Create a context with a default value.
pub fn create_context(default_value: Value) -> ContextHandle {
    let id = ContextId::new();
    ContextHandle(Arc::new(ContextInner {
        id: RwLock::new(id),
        provider: RwLock::new(Provider::new(id)),
        default_value: RwLock::new(default_value),
    }))
}

/// Innermost provided value for `context`, or its default.
pub fn use_context(context: &ContextHandle) -> Value {
    Owner::lookup(context.id()).unwrap_or_else(|| context.default_value())
}
