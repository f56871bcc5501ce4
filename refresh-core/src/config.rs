//! Runtime configuration.
//!
//! Loaded from JSON (a dev-server plugin passes its options through) or from
//! the environment:
//!
//! - `REFRESH_TRANSPORT`: flavor name, e.g. `vite` or `rspack-esm`
//! - `REFRESH_DEV_MODE`: `1`/`true` or `0`/`false`

use serde::{Deserialize, Serialize};

use crate::error::{RefreshError, RefreshResult};
use crate::transport::{DeclineTable, TransportKind};

pub const ENV_TRANSPORT: &str = "REFRESH_TRANSPORT";
pub const ENV_DEV_MODE: &str = "REFRESH_DEV_MODE";

fn default_dev_mode() -> bool {
    cfg!(debug_assertions)
}

/// How the runtime talks to the dev server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Dev-server flavor.
    pub transport: TransportKind,
    /// Whether the reactive runtime exposes its development introspection.
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
    /// Per-flavor decline overrides.
    pub decline: DeclineTable,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Esm,
            dev_mode: default_dev_mode(),
            decline: DeclineTable::default(),
        }
    }
}

impl RefreshConfig {
    pub fn from_json(json: &str) -> RefreshResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> RefreshResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> RefreshResult<Self> {
        let mut config = Self::default();

        if let Some(transport) = lookup(ENV_TRANSPORT) {
            config.transport = transport.trim().parse()?;
        }

        if let Some(dev_mode) = lookup(ENV_DEV_MODE) {
            config.dev_mode = match dev_mode.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(RefreshError::InvalidEnv {
                        key: ENV_DEV_MODE,
                        value: other.to_string(),
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_decline(mut self, decline: DeclineTable) -> Self {
        self.decline = decline;
        self
    }
}
