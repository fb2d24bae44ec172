//! Daemon configuration.
//!
//! Layered with figment: built-in defaults, then a TOML file, then
//! `CRAFTBRIDGE_*` environment variables, then CLI overrides.

use std::collections::HashMap;

use anyhow::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::core::event::EventKind;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// A server entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Channel that receives this server's event notices.
    pub channel: u64,
}

/// A webhook route for one channel id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    pub channel: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds between liveness sweeps over unmonitored servers.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Bound on a single RPC exchange, connect included.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub log_json: bool,
    /// Servers registered at startup.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    /// Per-event-kind toggles, keyed by [`EventKind::key`]. Missing kinds
    /// default to enabled; unknown keys are ignored.
    #[serde(default)]
    pub notifications: HashMap<String, bool>,
    #[serde(default)]
    pub webhooks: Vec<WebhookEntry>,
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_rpc_timeout() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            verbose: false,
            log_json: false,
            servers: Vec::new(),
            notifications: HashMap::new(),
            webhooks: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load<A: Serialize>(path: &str, overrides: Option<&A>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CRAFTBRIDGE_"));

        if let Some(args) = overrides {
            figment = figment.merge(Serialized::defaults(args));
        }

        Ok(figment.extract()?)
    }
}

/// Snapshot of per-event-kind notification toggles.
#[derive(Debug, Clone, Default)]
pub struct NotificationPrefs {
    overrides: HashMap<String, bool>,
}

impl NotificationPrefs {
    pub fn new(overrides: HashMap<String, bool>) -> Self {
        Self { overrides }
    }

    /// Kinds not present in the config are enabled.
    pub fn enabled(&self, kind: EventKind) -> bool {
        self.overrides.get(kind.key()).copied().unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn prefs_default_to_enabled() {
        let prefs = NotificationPrefs::default();

        for kind in EventKind::ALL {
            assert!(prefs.enabled(kind));
        }
    }

    #[test]
    fn prefs_respect_overrides() {
        let mut map = HashMap::new();
        map.insert("server_status".to_string(), false);
        let prefs = NotificationPrefs::new(map);

        assert!(!prefs.enabled(EventKind::ServerStatus));
        assert!(prefs.enabled(EventKind::PlayersJoined));
    }

    #[test]
    fn load_reads_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
sweep_interval_secs = 5

[[servers]]
name = "Alpha"
host = "10.0.0.5"
port = 25585
channel = 42

[notifications]
server_status = false

[[webhooks]]
channel = 42
url = "https://example.invalid/hook"
"#
        )
        .unwrap();

        let config =
            AppConfig::load(file.path().to_str().unwrap(), None::<&AppConfig>).unwrap();

        assert_eq!(config.sweep_interval_secs, 5);
        assert_eq!(config.rpc_timeout_secs, DEFAULT_RPC_TIMEOUT_SECS);
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].name, "Alpha");
        assert_eq!(config.notifications.get("server_status"), Some(&false));
        assert_eq!(config.webhooks[0].channel, 42);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = AppConfig::load("does-not-exist.toml", None::<&AppConfig>).unwrap();

        assert_eq!(config.sweep_interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);
        assert!(config.servers.is_empty());
    }
}
