//! In-memory hot host.
//!
//! Stands in for a dev server's hot API: records what the adapters ask for
//! and lets callers play the host's part by delivering updates and disposing
//! instances.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    AcceptCallback, AcceptedModule, DisposeCallback, EsmHot, HotData, HotModule, StandardHot,
};

/// A request made to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotEvent {
    Accepted,
    Invalidated,
    Declined,
    Reloaded,
    Disposed,
}

/// One module instance's hot object.
pub struct MemoryHot {
    id: String,
    data: Option<HotData>,
    events: Mutex<Vec<HotEvent>>,
    accept_callbacks: Mutex<Vec<AcceptCallback>>,
    dispose_callbacks: Mutex<Vec<DisposeCallback>>,
}

impl MemoryHot {
    fn with_data(id: impl Into<String>, data: Option<HotData>) -> Self {
        Self {
            id: id.into(),
            data,
            events: Mutex::new(Vec::new()),
            accept_callbacks: Mutex::new(Vec::new()),
            dispose_callbacks: Mutex::new(Vec::new()),
        }
    }

    /// A host whose data persists for the life of the module.
    pub fn esm(id: impl Into<String>) -> Self {
        Self::with_data(id, Some(HotData::new()))
    }

    /// A first-load dispose-then-accept host: no data until an instance is disposed.
    pub fn standard(id: impl Into<String>) -> Self {
        Self::with_data(id, None)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requests made so far, in order.
    pub fn events(&self) -> Vec<HotEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: HotEvent) -> usize {
        self.events.lock().iter().filter(|e| **e == event).count()
    }

    fn record(&self, event: HotEvent) {
        trace!(module = %self.id, ?event, "hot request");
        self.events.lock().push(event);
    }

    /// Run the stored accept callbacks with `module`. They stay registered.
    pub fn deliver_update(&self, module: Option<AcceptedModule>) {
        let mut callbacks = std::mem::take(&mut *self.accept_callbacks.lock());
        for callback in callbacks.iter_mut() {
            callback(module.clone());
        }

        // Keep any callback registered while the others ran.
        let mut slot = self.accept_callbacks.lock();
        callbacks.append(&mut slot);
        *slot = callbacks;
    }

    /// Evaluate a new module version and hand it to the previous version's
    /// accept callbacks, which are then retired.
    pub fn apply_update(&self, evaluate: impl FnOnce()) {
        let mut previous = std::mem::take(&mut *self.accept_callbacks.lock());
        evaluate();

        let module = AcceptedModule { id: self.id.clone() };
        for callback in previous.iter_mut() {
            callback(Some(module.clone()));
        }
    }

    /// Discard this instance: run its dispose callbacks against fresh data and
    /// return the hot object of the next instance.
    pub fn dispose(&self) -> Arc<MemoryHot> {
        self.record(HotEvent::Disposed);

        let data = HotData::new();
        let callbacks = std::mem::take(&mut *self.dispose_callbacks.lock());
        for callback in callbacks {
            callback(&data);
        }

        Arc::new(Self::with_data(self.id.clone(), Some(data)))
    }
}

impl HotModule for MemoryHot {
    fn data(&self) -> Option<HotData> {
        self.data.clone()
    }

    fn invalidate(&self) {
        self.record(HotEvent::Invalidated);
    }

    fn decline(&self) {
        self.record(HotEvent::Declined);
    }

    fn reload_page(&self) {
        self.record(HotEvent::Reloaded);
    }
}

impl EsmHot for MemoryHot {
    fn accept(&self, callback: AcceptCallback) {
        self.record(HotEvent::Accepted);
        self.accept_callbacks.lock().push(callback);
    }
}

impl StandardHot for MemoryHot {
    fn accept(&self) {
        self.record(HotEvent::Accepted);
    }

    fn dispose(&self, callback: DisposeCallback) {
        self.dispose_callbacks.lock().push(callback);
    }
}

impl fmt::Debug for MemoryHot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHot")
            .field("id", &self.id)
            .field("has_data", &self.data.is_some())
            .field("events", &self.events())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, SharedRegistry};
    use crate::transport::REGISTRY_CURRENT;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn constructors_differ_in_data() {
        assert!(MemoryHot::esm("a").data().is_some());
        assert!(MemoryHot::standard("a").data().is_none());
    }

    #[test]
    fn delivered_updates_keep_callbacks() {
        let hot = MemoryHot::esm("a");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        EsmHot::accept(
            &hot,
            Box::new(move |module| {
                assert_eq!(module.map(|m| m.id), Some("a".to_string()));
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        hot.deliver_update(Some(AcceptedModule { id: "a".into() }));
        hot.deliver_update(Some(AcceptedModule { id: "a".into() }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn applied_updates_retire_old_callbacks() {
        let hot = MemoryHot::esm("a");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        EsmHot::accept(
            &hot,
            Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        hot.apply_update(|| {});
        hot.apply_update(|| {});
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispose_hands_data_to_the_next_instance() {
        let hot = MemoryHot::standard("a");
        let registry = SharedRegistry::new(Registry::new());
        let stored = registry.clone();
        StandardHot::dispose(&hot, Box::new(move |data| data.insert(REGISTRY_CURRENT, stored)));

        let next = hot.dispose();
        assert_eq!(hot.events(), vec![HotEvent::Disposed]);
        assert!(next.data().unwrap().current().unwrap().ptr_eq(&registry));
        assert!(next.events().is_empty());
    }
}
