//! Provider scopes.
//!
//! A provider makes a value visible, keyed by a context token, to everything
//! rendered inside it. The scope is a thread-local stack; lookups walk it from
//! the innermost provider outwards.
//!
//! Render nodes that compute lazily capture the stack at creation time with
//! [`Owner::snapshot`] and reinstall it when they run, so a node recomputed
//! after a hot swap still sees the providers that surrounded it originally.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

/// Token identifying a context. Provider and consumer match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Generate a new unique context token.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static PROVIDED: RefCell<Vec<(ContextId, Value)>> = const { RefCell::new(Vec::new()) };
}

/// Captured provider stack.
#[derive(Debug, Clone, Default)]
pub struct OwnerScope {
    entries: Vec<(ContextId, Value)>,
}

impl OwnerScope {
    /// Run `f` with this scope installed in place of the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let saved = PROVIDED.with(|stack| stack.replace(self.entries.clone()));
        let _restore = Restore(Some(saved));
        f()
    }
}

struct Restore(Option<Vec<(ContextId, Value)>>);

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(saved) = self.0.take() {
            PROVIDED.with(|stack| *stack.borrow_mut() = saved);
        }
    }
}

struct Pop;

impl Drop for Pop {
    fn drop(&mut self) {
        PROVIDED.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Access to the current provider stack.
pub struct Owner;

impl Owner {
    /// Run `f` with `value` provided under `id`.
    pub fn provide<R>(id: ContextId, value: Value, f: impl FnOnce() -> R) -> R {
        PROVIDED.with(|stack| stack.borrow_mut().push((id, value)));
        let _pop = Pop;
        f()
    }

    /// Innermost value provided under `id`, if any.
    pub fn lookup(id: ContextId) -> Option<Value> {
        PROVIDED.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|(entry_id, _)| *entry_id == id)
                .map(|(_, value)| value.clone())
        })
    }

    /// Capture the current provider stack.
    pub fn snapshot() -> OwnerScope {
        OwnerScope {
            entries: PROVIDED.with(|stack| stack.borrow().clone()),
        }
    }
}
