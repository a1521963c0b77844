use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "TWIN_SYNC_CONFIG";
const API_KEY_ENV: &str = "TRELLO_API_KEY";
const API_TOKEN_ENV: &str = "TRELLO_API_TOKEN";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub trello: TrelloConfig,
    pub twin: TwinConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct TrelloConfig {
    pub api_key: String,
    #[serde(alias = "token")]
    pub api_token: String,
    /// Override for the REST base URL, e.g. a local recording proxy.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwinConfig {
    /// Member whose assignment starts and whose removal ends twinning.
    #[serde(rename = "ref_member_ID", alias = "ref_member_id")]
    pub ref_member_id: String,
    #[serde(rename = "target_list_ID", alias = "target_list_id")]
    pub target_list_id: String,
    /// Callback registered on watch-webhooks; should point at `/sync`.
    #[serde(rename = "webhook_URL", alias = "webhook_url")]
    pub webhook_url: String,
    /// Passed through to Trello's `keepFromSource` when copying.
    #[serde(default)]
    pub keep_from_source: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".twin-sync")
}

/// Explicit path, then `TWIN_SYNC_CONFIG`, then `~/.twin-sync/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => data_dir().join("config.toml"),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = config_path(explicit);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

impl AppConfig {
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.trello.api_key = key;
        }
        if let Some(token) = var(API_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.trello.api_token = token;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("trello.api_key", &self.trello.api_key),
            ("trello.api_token", &self.trello.api_token),
            ("twin.ref_member_ID", &self.twin.ref_member_id),
            ("twin.target_list_ID", &self.twin.target_list_id),
            ("twin.webhook_URL", &self.twin.webhook_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("Missing required config value `{name}`");
            }
        }
        Ok(())
    }
}
