//! Accept-with-new-module adapter (`esm`, `vite`).

use std::sync::Arc;

use tracing::{debug, info};

use super::{decline, DeclineGate, EsmHot, HotData, HotHandle, REGISTRY_CURRENT, REGISTRY_PREVIOUS};
use crate::config::RefreshConfig;
use crate::patch::reconcile_with_report;
use crate::registry::{Registry, SharedRegistry};

/// Patch the latest registry into the canonical one. True means reload.
fn patch_slots(data: &HotData) -> bool {
    let (Some(current), Some(previous)) = (data.current(), data.previous()) else {
        return false;
    };

    // First evaluation: nothing to reconcile against.
    if current.ptr_eq(&previous) {
        return false;
    }

    let new = previous.lock();
    let report = reconcile_with_report(&mut current.lock(), &new);
    if report.must_reload() {
        info!(
            removed = ?report.removed,
            contexts_removed = ?report.contexts_removed,
            "module needs a full reload"
        );
    }
    report.must_reload()
}

/// Register a module evaluation with an accept-with-new-module host.
pub fn refresh_esm(
    config: &RefreshConfig,
    gate: &DeclineGate,
    hot: Arc<dyn EsmHot>,
    registry: Registry,
) {
    let kind = config.transport;

    if gate.should_decline(config.dev_mode) {
        decline(kind, &HotHandle::Esm(hot), false, &config.decline);
        return;
    }

    let Some(data) = hot.data() else {
        debug!(transport = %kind, "host provides no hot data, invalidating");
        hot.invalidate();
        return;
    };

    let registry = SharedRegistry::new(registry);
    data.get_or_insert(REGISTRY_CURRENT, registry.clone());
    data.insert(REGISTRY_PREVIOUS, registry);

    let weak = Arc::downgrade(&hot);
    hot.accept(Box::new(move |module| {
        let must_reload = match module {
            Some(module) => {
                debug!(module = %module.id, "patching accepted module");
                patch_slots(&data)
            }
            None => true,
        };

        if must_reload {
            if let Some(hot) = weak.upgrade() {
                hot.invalidate();
            }
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Props, View};
    use crate::registry::RegistrationOptions;
    use crate::transport::memory::{HotEvent, MemoryHot};
    use crate::transport::{AcceptedModule, HotModule, TransportKind};
    use serde_json::Value;

    fn module(text: &'static str, extra: bool) -> (Registry, Component) {
        let mut registry = Registry::new();
        let proxy = registry.register_component(
            "Foo",
            Component::new("Foo", move |_: &Props| View::text(text)),
            RegistrationOptions::new(),
        );
        if extra {
            registry.register_component(
                "Bar",
                Component::new("Bar", |_: &Props| View::Empty),
                RegistrationOptions::new(),
            );
        }
        (registry, proxy)
    }

    fn config() -> RefreshConfig {
        RefreshConfig::default()
            .with_transport(TransportKind::Vite)
            .with_dev_mode(true)
    }

    #[test]
    fn first_evaluation_fills_both_slots() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        let (registry, _) = module("A", false);

        refresh_esm(&config(), &DeclineGate::new(), hot.clone(), registry);

        let data = hot.data().unwrap();
        assert!(data.current().unwrap().ptr_eq(&data.previous().unwrap()));
        assert_eq!(hot.events(), vec![HotEvent::Accepted]);
    }

    #[test]
    fn accepted_update_patches_in_place() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        let gate = DeclineGate::new();
        let (v1, proxy) = module("A", false);
        refresh_esm(&config(), &gate, hot.clone(), v1);

        hot.apply_update(|| refresh_esm(&config(), &gate, hot.clone(), module("B", false).0));

        assert_eq!(proxy.render(&Value::Null), View::text("B"));
        assert!(!hot.events().contains(&HotEvent::Invalidated));
    }

    #[test]
    fn removal_invalidates() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        let gate = DeclineGate::new();
        refresh_esm(&config(), &gate, hot.clone(), module("A", true).0);

        hot.apply_update(|| refresh_esm(&config(), &gate, hot.clone(), module("A", false).0));

        assert_eq!(hot.count(HotEvent::Invalidated), 1);
    }

    #[test]
    fn failed_module_invalidates() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        refresh_esm(&config(), &DeclineGate::new(), hot.clone(), module("A", false).0);

        hot.deliver_update(None);
        assert_eq!(hot.count(HotEvent::Invalidated), 1);
    }

    #[test]
    fn stale_callback_on_first_registry_is_harmless() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        refresh_esm(&config(), &DeclineGate::new(), hot.clone(), module("A", false).0);

        hot.deliver_update(Some(AcceptedModule { id: "src/App.tsx".into() }));
        assert_eq!(hot.count(HotEvent::Invalidated), 0);
    }

    #[test]
    fn missing_dev_mode_declines_without_touching_data() {
        let hot = Arc::new(MemoryHot::esm("src/App.tsx"));
        let config = RefreshConfig::default()
            .with_transport(TransportKind::Esm)
            .with_dev_mode(false);

        refresh_esm(&config, &DeclineGate::new(), hot.clone(), module("A", false).0);

        assert_eq!(hot.events(), vec![HotEvent::Declined]);
        assert!(hot.data().unwrap().current().is_none());
    }

    #[test]
    fn host_without_data_invalidates() {
        let hot = Arc::new(MemoryHot::standard("src/App.tsx"));
        refresh_esm(&config(), &DeclineGate::new(), hot.clone(), module("A", false).0);
        assert_eq!(hot.events(), vec![HotEvent::Invalidated]);
    }
}
