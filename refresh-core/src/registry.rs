//! Per-module registry of hot-swappable bindings.
//!
//! The rewritten module calls [`create_registry`] once, then
//! [`register_component`] / [`register_context`] for every component-like
//! declaration in top-level evaluation order, substituting the returned
//! values for the original bindings. Each registration owns a reactive cell;
//! its proxy reads that cell, and [`ComponentRegistration::update`] writes it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::component::{Component, ComponentProxy};
use crate::context_handle::ContextHandle;
use crate::dependencies::Dependencies;
use crate::reactive::Signal;
use crate::snapshot::{ComponentEntry, RegistrySnapshot};

/// Optional metadata supplied by the rewriting pass.
#[derive(Debug, Clone, Default)]
pub struct RegistrationOptions {
    /// Content hash of the component body (granular mode).
    pub signature: Option<String>,
    /// Closed-over bindings (granular mode).
    pub dependencies: Option<Dependencies>,
    /// Human-readable source position. Diagnostic only.
    pub location: Option<String>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Live record for one exported component.
#[derive(Clone)]
pub struct ComponentRegistration {
    id: String,
    component: Component,
    proxy: Component,
    cell: Signal<Option<Component>>,
    signature: Option<String>,
    dependencies: Option<Dependencies>,
    location: Option<String>,
}

impl ComponentRegistration {
    fn new(id: String, component: Component, options: RegistrationOptions) -> Self {
        let RegistrationOptions {
            signature,
            dependencies,
            location,
        } = options;

        // Signature and dependencies travel together.
        let dependencies = match (&signature, dependencies) {
            (Some(_), deps) => Some(deps.unwrap_or_default()),
            (None, Some(_)) => {
                debug!(id = %id, "dependencies without a signature are ignored");
                None
            }
            (None, None) => None,
        };

        let cell = Signal::new(Some(component.clone()));
        let proxy = Component::from_callable(ComponentProxy::new(
            id.clone(),
            location.clone(),
            cell.clone(),
        ));

        Self {
            id,
            component,
            proxy,
            cell,
            signature,
            dependencies,
            location,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The render function this registration was created with.
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// The stable wrapper handed to call sites.
    pub fn proxy(&self) -> &Component {
        &self.proxy
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn dependencies(&self) -> Option<&Dependencies> {
        self.dependencies.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// What the proxy currently delegates to.
    pub fn current(&self) -> Option<Component> {
        self.cell.get_untracked()
    }

    /// Take over another registration's signature and dependencies, so later
    /// edits are compared against the body that is actually installed.
    pub(crate) fn adopt_metadata(&mut self, other: &ComponentRegistration) {
        self.signature = other.signature.clone();
        self.dependencies = other.dependencies.clone();
    }

    /// Redirect the proxy's cell.
    pub fn update(&self, component: Component) {
        trace!(id = %self.id, to = %component.name(), "redirecting component cell");
        self.cell.set(Some(component));
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("dependencies", &self.dependencies.as_ref().map(|d| d.len()))
            .field("location", &self.location)
            .finish()
    }
}

/// Live record for one exported context.
#[derive(Debug, Clone)]
pub struct ContextRegistration {
    id: String,
    context: ContextHandle,
}

impl ContextRegistration {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &ContextHandle {
        &self.context
    }
}

/// All registrations made by one module evaluation.
#[derive(Debug, Default)]
pub struct Registry {
    components: IndexMap<String, ComponentRegistration>,
    contexts: IndexMap<String, ContextRegistration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component and return its proxy.
    ///
    /// A repeated id overwrites the earlier registration.
    pub fn register_component(
        &mut self,
        id: impl Into<String>,
        component: Component,
        options: RegistrationOptions,
    ) -> Component {
        let id = id.into();
        let registration = ComponentRegistration::new(id.clone(), component, options);
        let proxy = registration.proxy.clone();

        if self.components.insert(id.clone(), registration).is_some() {
            debug!(id = %id, "component registration overwritten");
        }

        proxy
    }

    /// Register a context and return it unchanged.
    pub fn register_context(
        &mut self,
        id: impl Into<String>,
        context: ContextHandle,
    ) -> ContextHandle {
        let id = id.into();
        let registration = ContextRegistration {
            id: id.clone(),
            context: context.clone(),
        };

        if self.contexts.insert(id.clone(), registration).is_some() {
            debug!(id = %id, "context registration overwritten");
        }

        context
    }

    pub fn component(&self, id: &str) -> Option<&ComponentRegistration> {
        self.components.get(id)
    }

    pub fn context(&self, id: &str) -> Option<&ContextRegistration> {
        self.contexts.get(id)
    }

    pub fn components(&self) -> &IndexMap<String, ComponentRegistration> {
        &self.components
    }

    pub fn contexts(&self) -> &IndexMap<String, ContextRegistration> {
        &self.contexts
    }

    pub(crate) fn components_mut(&mut self) -> &mut IndexMap<String, ComponentRegistration> {
        &mut self.components
    }

    pub(crate) fn contexts_mut(&mut self) -> &mut IndexMap<String, ContextRegistration> {
        &mut self.contexts
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.contexts.is_empty()
    }

    /// Serializable metadata for diagnostics.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            components: self
                .components
                .values()
                .map(|registration| ComponentEntry {
                    id: registration.id.clone(),
                    name: registration.component.name(),
                    signature: registration.signature.clone(),
                    dependencies: registration
                        .dependencies
                        .as_ref()
                        .map(|deps| deps.keys().cloned().collect()),
                    location: registration.location.clone(),
                })
                .collect(),
            contexts: self.contexts.keys().cloned().collect(),
        }
    }
}

/// A registry shared between a module instance and persistent hot data.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<Mutex<Registry>>);

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self(Arc::new(Mutex::new(registry)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.lock()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

/// Fresh registry for one module evaluation.
pub fn create_registry() -> Registry {
    Registry::new()
}

/// Register a component; returns the proxy to bind in its place.
pub fn register_component(
    registry: &mut Registry,
    id: impl Into<String>,
    component: Component,
    options: RegistrationOptions,
) -> Component {
    registry.register_component(id, component, options)
}

/// Register a context; returns it unchanged.
pub fn register_context(
    registry: &mut Registry,
    id: impl Into<String>,
    context: ContextHandle,
) -> ContextHandle {
    registry.register_context(id, context)
}
