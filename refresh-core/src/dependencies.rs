//! Closed-over bindings of a component.
//!
//! In granular mode the rewriting pass snapshots every free variable a
//! component reads (module constants, sibling components, imported helpers).
//! Two snapshots are compared shallowly: primitives by value, everything else
//! by pointer. NaN equals NaN so a numeric constant that happens to be NaN does
//! not remount its component on every edit.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::Component;

/// Snapshot of a component's closed-over bindings.
pub type Dependencies = IndexMap<String, DepValue>;

/// A single closed-over binding.
#[derive(Clone)]
pub enum DepValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    /// Compared by pointer.
    Component(Component),
    /// Any other shared value. Compared by pointer.
    Object(Arc<dyn Any + Send + Sync>),
}

impl DepValue {
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        DepValue::Object(Arc::new(value))
    }

    /// Identity comparison.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (DepValue::Undefined, DepValue::Undefined) | (DepValue::Null, DepValue::Null) => true,
            (DepValue::Bool(a), DepValue::Bool(b)) => a == b,
            (DepValue::Number(a), DepValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (DepValue::Str(a), DepValue::Str(b)) => a == b,
            (DepValue::Component(a), DepValue::Component(b)) => a.ptr_eq(b),
            (DepValue::Object(a), DepValue::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<bool> for DepValue {
    fn from(value: bool) -> Self {
        DepValue::Bool(value)
    }
}

impl From<f64> for DepValue {
    fn from(value: f64) -> Self {
        DepValue::Number(value)
    }
}

impl From<i32> for DepValue {
    fn from(value: i32) -> Self {
        DepValue::Number(f64::from(value))
    }
}

impl From<&str> for DepValue {
    fn from(value: &str) -> Self {
        DepValue::Str(Arc::from(value))
    }
}

impl From<String> for DepValue {
    fn from(value: String) -> Self {
        DepValue::Str(Arc::from(value))
    }
}

impl From<Component> for DepValue {
    fn from(value: Component) -> Self {
        DepValue::Component(value)
    }
}

impl fmt::Debug for DepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepValue::Undefined => f.write_str("Undefined"),
            DepValue::Null => f.write_str("Null"),
            DepValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            DepValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            DepValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            DepValue::Component(c) => f.debug_tuple("Component").field(&c.name()).finish(),
            DepValue::Object(o) => write!(f, "Object({:p})", Arc::as_ptr(o)),
        }
    }
}

/// Whether two dependency snapshots differ.
///
/// One side absent and the other present counts as a change; both absent
/// does not.
pub fn dependencies_changed(old: Option<&Dependencies>, new: Option<&Dependencies>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(old), Some(new)) => {
            old.len() != new.len()
                || old.iter().any(|(key, value)| {
                    new.get(key).map_or(true, |other| !value.is_same(other))
                })
        }
        _ => true,
    }
}
