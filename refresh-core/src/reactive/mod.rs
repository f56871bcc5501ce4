//! Reactive Primitives
//!
//! The substrate the hot-swap layer stands on: signals (reactive cells),
//! memos, effects, and provider scopes.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal holds mutable state. A read inside a tracking context (a memo or
//! an effect) registers that context as a dependent; a write notifies every
//! dependent before it returns. Each component proxy owns exactly one signal.
//!
//! ## Memos
//!
//! A Memo caches a derived value and recomputes it only after one of its
//! sources changed. Proxy render nodes are memos.
//!
//! ## Effects
//!
//! An Effect re-runs eagerly whenever a dependency changes. Hosts mount views
//! inside effects.
//!
//! # Implementation Notes
//!
//! Dependency tracking is automatic: a thread-local stack records which
//! computation is running, and a global runtime keeps the source-to-subscriber
//! edges. SolidJS and Leptos use the same model.

mod context;
mod effect;
mod memo;
mod owner;
mod runtime;
mod signal;
mod subscriber;

pub use context::{untrack, ReactiveContext};
pub use effect::Effect;
pub use memo::{Memo, MemoState};
pub use owner::{ContextId, Owner, OwnerScope};
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use signal::Signal;
pub use subscriber::{SourceId, SubscriberId};
