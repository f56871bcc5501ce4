//! Component Proxy
//!
//! The proxy is the call-site-stable identity of a hot-swappable component.
//! It owns no behavior of its own: every render and every metadata access is
//! delegated to whatever its cell currently holds.
//!
//! # Render paths
//!
//! - The cell is empty, or holds a dev-marked callable (another proxy or a dev
//!   component): the proxy returns a [`View::Dynamic`] node over a memo that
//!   reads the cell. Redirecting the cell dirties that node alone; the parent
//!   that rendered the proxy never runs again.
//! - The cell holds a plain function: it is called directly, with no reactive
//!   indirection.

use std::fmt;

use serde_json::Value;

use super::{CallableWithProperties, Component, Props, View};
use crate::reactive::{untrack, Memo, Owner, Signal};

/// Indirection over a component cell.
pub struct ComponentProxy {
    id: String,
    location: Option<String>,
    cell: Signal<Option<Component>>,
}

impl ComponentProxy {
    pub fn new(
        id: impl Into<String>,
        location: Option<String>,
        cell: Signal<Option<Component>>,
    ) -> Self {
        Self {
            id: id.into(),
            location,
            cell,
        }
    }

    /// Registration id this proxy stands for.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source position recorded at registration, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The live implementation.
    pub fn get_component(&self) -> Option<Component> {
        self.cell.get_untracked()
    }

    /// Redirect the proxy to a new implementation.
    pub fn set_component(&self, component: Component) {
        self.cell.set(Some(component));
    }

    fn render_reactive(&self, props: &Props) -> View {
        let cell = self.cell.clone();
        let props = props.clone();
        let scope = Owner::snapshot();

        View::Dynamic(Memo::new(move || match cell.get() {
            Some(component) => scope.run(|| untrack(|| component.render(&props))),
            None => View::Empty,
        }))
    }
}

impl CallableWithProperties for ComponentProxy {
    fn call(&self, props: &Props) -> View {
        match self.get_component() {
            Some(component) if !component.is_dev_component() => component.render(props),
            _ => self.render_reactive(props),
        }
    }

    fn name(&self) -> String {
        self.get_component()
            .map(|component| component.name())
            .unwrap_or_else(|| self.id.clone())
    }

    fn is_dev_component(&self) -> bool {
        true
    }

    fn property(&self, key: &str) -> Option<Value> {
        self.get_component()?.property(key)
    }

    fn set_property(&self, key: &str, value: Value) {
        if let Some(component) = self.get_component() {
            component.set_property(key, value);
        }
    }
}

impl fmt::Debug for ComponentProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentProxy")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("current", &self.get_component())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn proxy_over(component: Option<Component>) -> (Component, Signal<Option<Component>>) {
        let cell = Signal::new(component);
        let proxy = Component::from_callable(ComponentProxy::new("Foo", None, cell.clone()));
        (proxy, cell)
    }

    #[test]
    fn plain_function_is_called_directly() {
        let plain = Component::new("Foo", |_: &Props| View::text("A"));
        let (proxy, _) = proxy_over(Some(plain));

        let view = proxy.render(&Value::Null);
        assert_eq!(view, View::text("A"));
    }

    #[test]
    fn dev_component_renders_through_reactive_node() {
        let dev = Component::dev("Foo", |_: &Props| View::text("A"));
        let (proxy, cell) = proxy_over(Some(dev));

        let view = proxy.render(&Value::Null);
        assert!(view.is_dynamic());
        assert_eq!(view.to_text(), "A");

        cell.set(Some(Component::dev("Foo", |_: &Props| View::text("B"))));
        assert_eq!(view.to_text(), "B");
    }

    #[test]
    fn empty_cell_renders_nothing() {
        let (proxy, _) = proxy_over(None);
        let view = proxy.render(&Value::Null);

        assert_eq!(view.resolve(), View::Empty);
        assert_eq!(proxy.name(), "Foo");
    }

    #[test]
    fn props_reach_the_live_body() {
        let dev = Component::dev("Foo", |props: &Props| View::text(props["label"].to_string()));
        let (proxy, _) = proxy_over(Some(dev));

        assert_eq!(proxy.render(&json!({"label": 7})).to_text(), "7");
    }

    #[test]
    fn redirect_reruns_only_the_proxy_node() {
        let parent_runs = Arc::new(AtomicUsize::new(0));
        let dev = Component::dev("Foo", |_: &Props| View::text("A"));
        let (proxy, cell) = proxy_over(Some(dev));

        // The parent renders once and keeps the node it got back.
        let node = {
            let runs = parent_runs.clone();
            runs.fetch_add(1, Ordering::SeqCst);
            proxy.render(&Value::Null)
        };

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _mounted = Effect::new(move || seen_clone.lock().push(node.to_text()));

        cell.set(Some(Component::dev("Foo", |_: &Props| View::text("B"))));

        assert_eq!(*seen.lock(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(parent_runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metadata_is_forwarded_to_live_component() {
        let first = Component::new("Foo", |_: &Props| View::Empty);
        first.set_property("displayName", json!("First"));
        let (proxy, cell) = proxy_over(Some(first.clone()));

        assert_eq!(proxy.property("displayName"), Some(json!("First")));

        let second = Component::new("Bar", |_: &Props| View::Empty);
        cell.set(Some(second.clone()));
        assert_eq!(proxy.property("displayName"), None);
        assert_eq!(proxy.name(), "Bar");

        proxy.set_property("displayName", json!("Second"));
        assert_eq!(second.property("displayName"), Some(json!("Second")));
        assert_eq!(first.property("displayName"), Some(json!("First")));
    }
}
