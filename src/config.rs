use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub telegram: TelegramConfig,

    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    /// Default tracing filter; overridable via `RUST_LOG`.
    pub log_level: String,

    /// 0 lets the runtime pick.
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:vidra.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token; usually supplied via `VIDRA_TELEGRAM_TOKEN`.
    pub token: String,

    /// External user id of the privileged operator, matched exactly.
    pub admin_user_id: String,

    /// Long-poll window for update fetching.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            admin_user_id: String::new(),
            poll_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub base_url: String,

    pub api_key: String,

    /// Delay between job status polls.
    pub poll_interval_secs: u64,

    /// Upper bound on a single render before the client gives up.
    pub max_render_secs: u64,

    pub request_timeout_secs: u64,

    /// Where finished artifacts land before delivery; cleaned per run.
    pub download_dir: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9800".to_string(),
            api_key: String::new(),
            poll_interval_secs: 5,
            max_render_secs: 1800,
            request_timeout_secs: 60,
            download_dir: "downloads".to_string(),
        }
    }
}

impl Config {
    fn config_path() -> PathBuf {
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return local;
        }

        dirs::config_dir()
            .map_or(local, |dir| dir.join("vidra").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(token) = std::env::var("VIDRA_TELEGRAM_TOKEN") {
            config.telegram.token = token;
        }
        if let Ok(admin) = std::env::var("VIDRA_ADMIN_USER_ID") {
            config.telegram.admin_user_id = admin;
        }
        if let Ok(db) = std::env::var("VIDRA_DATABASE_PATH") {
            config.general.database_path = db;
        }
        if let Ok(key) = std::env::var("VIDRA_RENDERER_API_KEY") {
            config.renderer.api_key = key;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.is_empty() {
            bail!(
                "Telegram token missing. Set telegram.token in config.toml or VIDRA_TELEGRAM_TOKEN."
            );
        }
        if self.telegram.admin_user_id.is_empty() {
            bail!(
                "Admin user id missing. Set telegram.admin_user_id in config.toml or VIDRA_ADMIN_USER_ID."
            );
        }
        url::Url::parse(&self.renderer.base_url)
            .with_context(|| format!("Invalid renderer base_url: {}", self.renderer.base_url))?;

        Ok(())
    }

    pub fn create_default_if_missing() -> Result<()> {
        let path = PathBuf::from("config.toml");
        if path.exists() {
            return Ok(());
        }

        let default = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        std::fs::write(&path, default)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Default config written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_credentials() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn populated_config_validates() {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.telegram.admin_user_id = "959684975".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_renderer_url_is_rejected() {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.telegram.admin_user_id = "1".to_string();
        config.renderer.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
