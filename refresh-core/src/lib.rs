//! Refresh Core
//!
//! This crate provides the hot-swap runtime for components written against a
//! fine-grained reactive UI runtime. It implements:
//!
//! - Reactive primitives (signals, memos, effects, owner scopes)
//! - Stable component proxies over swappable render functions
//! - Registries recording one module evaluation's components and contexts
//! - A patch engine reconciling old and new registries in place
//! - Transport adapters for accept-with-module and dispose-then-accept hosts
//!
//! # Architecture
//!
//! - `reactive`: Signals, memos, effects and dependency tracking
//! - `component`: Components, views and the proxy indirection
//! - `registry`: Per-evaluation registration
//! - `patch`: Reconciliation of two registries
//! - `transport`: Dev-server hot API glue and decline policy
//! - `config`: Runtime configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use refresh_core::{create_registry, register_component, Component, RegistrationOptions, View};
//! use refresh_core::transport::{refresh, HotHandle};
//!
//! // Module evaluation, as emitted by the rewriting pass
//! let mut registry = create_registry();
//! let counter = register_component(
//!     &mut registry,
//!     "Counter",
//!     Component::new("Counter", |_| View::text("count")),
//!     RegistrationOptions::new().signature("a1b2"),
//! );
//!
//! // Hand the registry to the dev server
//! refresh(&config, HotHandle::Esm(hot), registry)?;
//!
//! // `counter` keeps its identity across every later edit
//! ```

pub mod component;
pub mod config;
pub mod context_handle;
pub mod dependencies;
pub mod error;
pub mod patch;
pub mod reactive;
pub mod registry;
pub mod snapshot;
pub mod transport;

pub use component::{CallableWithProperties, Component, Props, View};
pub use config::RefreshConfig;
pub use context_handle::{create_context, use_context, ContextHandle, Provider};
pub use dependencies::{DepValue, Dependencies};
pub use error::{RefreshError, RefreshResult};
pub use patch::{patch_components, patch_contexts, reconcile, reconcile_with_report, PatchReport};
pub use registry::{
    create_registry, register_component, register_context, RegistrationOptions, Registry,
};
pub use snapshot::RegistrySnapshot;
