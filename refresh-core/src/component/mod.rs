//! Components and their render output.
//!
//! A component is a render function from [`Props`] to a [`View`] plus a
//! metadata side-table. Call sites only ever hold a [`Component`] handle, a
//! cheap clone of an `Arc<dyn CallableWithProperties>` whose pointer identity
//! is the component's identity. Plain functions and [`ComponentProxy`] both
//! sit behind that handle, so a proxy can stand in anywhere a component can.

mod proxy;

pub use proxy::ComponentProxy;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::reactive::Memo;

/// Props passed to a component.
pub type Props = Value;

/// Render output.
#[derive(Clone, Default)]
pub enum View {
    /// Nothing rendered.
    #[default]
    Empty,
    /// A text node.
    Text(String),
    /// A sequence of children.
    Fragment(Vec<View>),
    /// A reactive node. Reading it recomputes only this node when its
    /// sources change.
    Dynamic(Memo<View>),
}

impl View {
    /// Build a text node.
    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    /// Check whether this view is a reactive node.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, View::Dynamic(_))
    }

    /// Flatten the view by reading every reactive node in it.
    ///
    /// Inside an effect this subscribes the effect to every node it reads.
    pub fn resolve(&self) -> View {
        match self {
            View::Dynamic(memo) => memo.get().resolve(),
            View::Fragment(children) => {
                View::Fragment(children.iter().map(View::resolve).collect())
            }
            other => other.clone(),
        }
    }

    /// Concatenated text of the resolved view.
    pub fn to_text(&self) -> String {
        match self.resolve() {
            View::Empty | View::Dynamic(_) => String::new(),
            View::Text(text) => text,
            View::Fragment(children) => children.iter().map(View::to_text).collect(),
        }
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (View::Empty, View::Empty) => true,
            (View::Text(a), View::Text(b)) => a == b,
            (View::Fragment(a), View::Fragment(b)) => a == b,
            (View::Dynamic(a), View::Dynamic(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty => f.write_str("Empty"),
            View::Text(text) => f.debug_tuple("Text").field(text).finish(),
            View::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            View::Dynamic(memo) => f.debug_tuple("Dynamic").field(&memo.id()).finish(),
        }
    }
}

/// A callable with forwarded metadata.
///
/// Rust callables cannot intercept property access, so metadata lives in an
/// explicit side-table reached through `property`/`set_property`.
pub trait CallableWithProperties: Send + Sync {
    /// Render with the given props.
    fn call(&self, props: &Props) -> View;

    /// Display name.
    fn name(&self) -> String;

    /// Whether this callable came out of the dev-wrapping path (proxies and
    /// dev components). Proxies render such callables reactively.
    fn is_dev_component(&self) -> bool;

    /// Read a metadata entry.
    fn property(&self, key: &str) -> Option<Value>;

    /// Write a metadata entry.
    fn set_property(&self, key: &str, value: Value);
}

type RenderFn = Box<dyn Fn(&Props) -> View + Send + Sync>;

/// A user render function with its metadata.
pub struct FunctionComponent {
    name: String,
    render: RenderFn,
    dev: bool,
    properties: RwLock<IndexMap<String, Value>>,
}

impl FunctionComponent {
    pub fn new<F>(name: impl Into<String>, render: F, dev: bool) -> Self
    where
        F: Fn(&Props) -> View + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Box::new(render),
            dev,
            properties: RwLock::new(IndexMap::new()),
        }
    }
}

impl CallableWithProperties for FunctionComponent {
    fn call(&self, props: &Props) -> View {
        (self.render)(props)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_dev_component(&self) -> bool {
        self.dev
    }

    fn property(&self, key: &str) -> Option<Value> {
        self.properties.read().get(key).cloned()
    }

    fn set_property(&self, key: &str, value: Value) {
        self.properties.write().insert(key.to_string(), value);
    }
}

/// Shared handle to a component. Identity is pointer identity.
#[derive(Clone)]
pub struct Component(Arc<dyn CallableWithProperties>);

impl Component {
    /// Wrap a plain render function.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props) -> View + Send + Sync + 'static,
    {
        Self::from_callable(FunctionComponent::new(name, render, false))
    }

    /// Wrap a render function that carries the dev-wrapping marker.
    pub fn dev<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props) -> View + Send + Sync + 'static,
    {
        Self::from_callable(FunctionComponent::new(name, render, true))
    }

    pub fn from_callable<C>(callable: C) -> Self
    where
        C: CallableWithProperties + 'static,
    {
        Self(Arc::new(callable))
    }

    pub fn render(&self, props: &Props) -> View {
        self.0.call(props)
    }

    pub fn name(&self) -> String {
        self.0.name()
    }

    pub fn is_dev_component(&self) -> bool {
        self.0.is_dev_component()
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.0.property(key)
    }

    pub fn set_property(&self, key: &str, value: Value) {
        self.0.set_property(key, value);
    }

    /// Check whether two handles point at the same component.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("dev", &self.is_dev_component())
            .finish()
    }
}
