use serde::Deserialize;
use std::path::PathBuf;

/// How the board backend pairs applications with a data ingester.
///
/// `Auto` picks the richest mode the backend supports; the choice is made
/// once at daemon startup and never re-probed per instance.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMode {
    Auto,
    /// The application loads its own data internally; no separate ingester.
    Embedded,
    /// Creation yields a paired background ingester the host can signal.
    Ingesting,
}

impl Default for IntegrationMode {
    fn default() -> Self {
        Self::Auto
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    /// Base directory that relative logdirs resolve against.
    pub base_dir: Option<PathBuf>,
    pub listen_addr: String,
    /// Default data reload interval in seconds, used when a create request
    /// omits the interval or passes zero.
    pub reload_interval: u64,
    pub purge_orphaned_data: bool,
    pub integration_mode: IntegrationMode,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            listen_addr: "127.0.0.1:57575".to_string(),
            reload_interval: 30,
            purge_orphaned_data: true,
            integration_mode: IntegrationMode::Auto,
        }
    }
}

impl GlobalConfig {
    /// Load config from disk, falling back to defaults when the file is
    /// missing or malformed. `BOARDHOST_CONFIG` overrides the path.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("BOARDHOST_CONFIG")
            .unwrap_or_else(|_| "config/global.toml".to_string());
        let s = std::fs::read_to_string(&path).unwrap_or_default();
        let cfg: Self = toml::from_str(&s).unwrap_or_default();
        Ok(cfg)
    }
}
