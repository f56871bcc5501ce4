//! Reactive Runtime
//!
//! The runtime connects sources to the computations that read them.
//!
//! 1. Memos and effects register themselves with the runtime on creation.
//! 2. A tracked read records a `source -> subscriber` edge.
//! 3. A write notifies the runtime, which marks every subscriber of that source
//!    "maybe dirty" and schedules the eager ones (effects). Memos stay lazy and
//!    recompute on their next read.
//!
//! The tables are global and guarded by `parking_lot` locks. Subscribers are
//! held weakly so a dropped view never keeps its render node alive.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::subscriber::{SourceId, SubscriberId};

/// A computation the runtime can notify.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this computation as potentially needing to re-run.
    fn mark_maybe_dirty(&self);

    /// Re-run this computation (effects only).
    fn schedule(&self);

    /// Effects are eager, memos are lazy.
    fn is_eager(&self) -> bool;
}

/// Handle to a registered computation.
///
/// Dropping this handle unregisters the computation from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

type SubscriberList = SmallVec<[SubscriberId; 4]>;

/// The global reactive runtime.
pub struct Runtime;

static REGISTRY: OnceLock<RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>>> = OnceLock::new();
static SOURCE_SUBSCRIBERS: OnceLock<RwLock<HashMap<SourceId, SubscriberList>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn get_source_subscribers() -> &'static RwLock<HashMap<SourceId, SubscriberList>> {
    SOURCE_SUBSCRIBERS.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Runtime {
    /// Register a computation with the runtime.
    ///
    /// Returns a handle that unregisters it when dropped.
    pub fn register(reactive: Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();
        get_registry().write().insert(id, Arc::downgrade(&reactive));
        ReactiveHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        get_registry().write().remove(&id);
        Self::clear_dependencies(id);
    }

    /// Record that a subscriber depends on a source.
    pub fn add_dependency(source_id: SourceId, subscriber_id: SubscriberId) {
        let mut subscribers = get_source_subscribers().write();
        let list = subscribers.entry(source_id).or_default();
        if !list.contains(&subscriber_id) {
            list.push(subscriber_id);
        }
    }

    /// Remove every edge into a subscriber.
    ///
    /// Called before a computation re-runs so stale reads do not linger.
    pub fn clear_dependencies(subscriber_id: SubscriberId) {
        let mut subscribers = get_source_subscribers().write();
        subscribers.retain(|_, subs| {
            subs.retain(|s| *s != subscriber_id);
            !subs.is_empty()
        });
    }

    /// Notify every subscriber of a source that it changed.
    pub fn notify_signal_change(source_id: SourceId) {
        let subscriber_ids = get_source_subscribers()
            .read()
            .get(&source_id)
            .cloned()
            .unwrap_or_default();

        if subscriber_ids.is_empty() {
            return;
        }

        // Locks are released before any callback runs: marking a memo dirty
        // re-enters the runtime to notify that memo's own subscribers.
        let reactives: Vec<Arc<dyn Reactive>> = {
            let registry = get_registry().read();
            subscriber_ids
                .iter()
                .filter_map(|id| registry.get(id).and_then(Weak::upgrade))
                .collect()
        };

        for reactive in &reactives {
            reactive.mark_maybe_dirty();
        }

        for reactive in reactives.into_iter().filter(|r| r.is_eager()) {
            reactive.schedule();
        }
    }

    /// Number of subscribers currently recorded for a source.
    pub fn subscriber_count(source_id: SourceId) -> usize {
        get_source_subscribers()
            .read()
            .get(&source_id)
            .map_or(0, |subs| subs.len())
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    struct MockReactive {
        id: SubscriberId,
        dirty: AtomicBool,
        scheduled: AtomicI32,
        eager: bool,
    }

    impl MockReactive {
        fn new(eager: bool) -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                dirty: AtomicBool::new(false),
                scheduled: AtomicI32::new(0),
                eager,
            })
        }
    }

    impl Reactive for MockReactive {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn mark_maybe_dirty(&self) {
            self.dirty.store(true, Ordering::SeqCst);
        }

        fn schedule(&self) {
            self.scheduled.fetch_add(1, Ordering::SeqCst);
        }

        fn is_eager(&self) -> bool {
            self.eager
        }
    }

    #[test]
    fn runtime_registers_and_unregisters() {
        let reactive = MockReactive::new(false);
        let id = reactive.id;

        let handle = Runtime::register(reactive);
        assert!(get_registry().read().contains_key(&id));

        drop(handle);
        assert!(!get_registry().read().contains_key(&id));
    }

    #[test]
    fn runtime_notifies_subscribers() {
        let memo = MockReactive::new(false);
        let effect = MockReactive::new(true);
        let source = SourceId::new();

        let _memo_handle = Runtime::register(memo.clone());
        let _effect_handle = Runtime::register(effect.clone());

        Runtime::add_dependency(source, memo.id);
        Runtime::add_dependency(source, effect.id);
        Runtime::notify_signal_change(source);

        assert!(memo.dirty.load(Ordering::SeqCst));
        assert!(effect.dirty.load(Ordering::SeqCst));

        // Only the eager one is scheduled
        assert_eq!(memo.scheduled.load(Ordering::SeqCst), 0);
        assert_eq!(effect.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_edges_are_recorded_once() {
        let reactive = MockReactive::new(true);
        let source = SourceId::new();
        let _handle = Runtime::register(reactive.clone());

        Runtime::add_dependency(source, reactive.id);
        Runtime::add_dependency(source, reactive.id);
        assert_eq!(Runtime::subscriber_count(source), 1);

        Runtime::notify_signal_change(source);
        assert_eq!(reactive.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runtime_clears_dependencies() {
        let reactive = MockReactive::new(false);
        let source = SourceId::new();
        let _handle = Runtime::register(reactive.clone());

        Runtime::add_dependency(source, reactive.id);
        assert_eq!(Runtime::subscriber_count(source), 1);

        Runtime::clear_dependencies(reactive.id);
        assert_eq!(Runtime::subscriber_count(source), 0);
    }

    #[test]
    fn dropped_subscribers_are_skipped() {
        let reactive = MockReactive::new(true);
        let source = SourceId::new();
        let handle = Runtime::register(reactive.clone());
        Runtime::add_dependency(source, reactive.id);

        drop(handle);
        Runtime::notify_signal_change(source);
        assert_eq!(reactive.scheduled.load(Ordering::SeqCst), 0);
    }
}
