//! Serializable registry metadata.
//!
//! Registries hold closures and reactive cells, so they never leave the
//! process. A snapshot carries what a dev server or a log line needs: ids,
//! signatures, dependency names, locations. JSON for humans, MessagePack for
//! the wire.

use serde::{Deserialize, Serialize};

use crate::error::RefreshResult;

/// Metadata of one component registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Names of the closed-over bindings, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Metadata of a whole registry, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub components: Vec<ComponentEntry>,
    pub contexts: Vec<String>,
}

impl RegistrySnapshot {
    /// Whether every registration records a signature.
    pub fn is_granular(&self) -> bool {
        !self.components.is_empty() && self.components.iter().all(|c| c.signature.is_some())
    }

    pub fn to_json(&self) -> RefreshResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> RefreshResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_msgpack(&self) -> RefreshResult<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> RefreshResult<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Props, View};
    use crate::dependencies::{DepValue, Dependencies};
    use crate::registry::{RegistrationOptions, Registry};
    use crate::context_handle::create_context;
    use serde_json::json;

    fn sample() -> Registry {
        let mut registry = Registry::new();
        let mut deps = Dependencies::new();
        deps.insert("LIMIT".into(), DepValue::from(3));

        registry.register_component(
            "Counter",
            Component::new("Counter", |_: &Props| View::Empty),
            RegistrationOptions::new()
                .signature("abc")
                .dependencies(deps)
                .location("src/Counter.tsx:1:1"),
        );
        registry.register_context("Theme", create_context(json!("light")));
        registry
    }

    #[test]
    fn snapshot_lists_registrations_in_order() {
        let snapshot = sample().snapshot();

        assert_eq!(snapshot.components.len(), 1);
        let counter = &snapshot.components[0];
        assert_eq!(counter.id, "Counter");
        assert_eq!(counter.signature.as_deref(), Some("abc"));
        assert_eq!(counter.dependencies, Some(vec!["LIMIT".to_string()]));
        assert_eq!(snapshot.contexts, vec!["Theme".to_string()]);
        assert!(snapshot.is_granular());
    }

    #[test]
    fn json_omits_absent_fields() {
        let mut registry = Registry::new();
        registry.register_component(
            "Plain",
            Component::new("Plain", |_: &Props| View::Empty),
            RegistrationOptions::new(),
        );

        let json = registry.snapshot().to_json().unwrap();
        assert!(!json.contains("signature"));
        assert!(!registry.snapshot().is_granular());
    }

    #[test]
    fn json_and_msgpack_decode_to_the_same_snapshot() {
        let snapshot = sample().snapshot();

        let from_json = RegistrySnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let from_msgpack = RegistrySnapshot::from_msgpack(&snapshot.to_msgpack().unwrap()).unwrap();

        assert_eq!(from_json, snapshot);
        assert_eq!(from_msgpack, snapshot);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(RegistrySnapshot::from_json("{").is_err());
        assert!(RegistrySnapshot::from_msgpack(&[0xc1]).is_err());
    }
}
