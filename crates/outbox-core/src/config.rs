use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::policy::{PolicyRule, QueuePolicy};

/// Remote coordination server the transport talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL; endpoints are appended to its path.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. Bounds how long one redelivery can stall a drain.
    pub request_timeout_secs: u64,
    /// Optional bearer token sent as `Authorization: Bearer <token>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            token: None,
        }
    }
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Queue backoff and retry parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// First flush delay after an enqueue, and the value backoff resets to.
    pub initial_interval_secs: u64,
    /// Upper bound for the doubled flush delay.
    pub max_interval_secs: u64,
    /// Failed redeliveries after which an entry is abandoned.
    pub max_retries: u32,
    /// Queue file; defaults to `~/.local/state/outbox/queue.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 30,
            max_interval_secs: 300,
            max_retries: 10,
            state_path: None,
        }
    }
}

impl QueueConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_secs(self.initial_interval_secs.max(1))
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs).max(self.initial_interval())
    }
}

/// Optional `[policy]` section replacing the built-in rule table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Global configuration loaded from `~/.config/outbox/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboxConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// If missing or empty, the built-in policy table is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
}

impl OutboxConfig {
    pub fn queue_policy(&self) -> QueuePolicy {
        match &self.policy {
            Some(p) if !p.rules.is_empty() => QueuePolicy::new(p.rules.clone()),
            _ => QueuePolicy::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("outbox")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<OutboxConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<OutboxConfig> {
    if !path.exists() {
        let default_cfg = OutboxConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(path)
}

pub fn load_from_path(path: &Path) -> Result<OutboxConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: OutboxConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
