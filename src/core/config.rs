use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://v6.exchangerate-api.com";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    pub base_currency: String,
    pub update_interval_seconds: u64,
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub fetch_timeout_seconds: u64,
    pub frontend_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: String::new(),
            base_currency: "USD".to_string(),
            update_interval_seconds: 7200,
            host: "0.0.0.0".to_string(),
            port: 5000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            fetch_timeout_seconds: 20,
            frontend_dir: PathBuf::from("front/build"),
        }
    }
}

/// Environment variables that take precedence over the config file.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    exchange_rate_api_key: Option<String>,
    base_currency: Option<String>,
    update_interval_seconds: Option<u64>,
    host: Option<String>,
    port: Option<u16>,
    exchange_rate_api_url: Option<String>,
    fetch_timeout_seconds: Option<u64>,
    frontend_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads the config file (explicit path, or the default location when present),
    /// applies environment overrides and validates the result.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_default()?,
        };
        let config = config.with_env_vars(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    fn load_default() -> Result<Self> {
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from_path(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "ratehub", "ratehub")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn with_env_vars<I>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvOverrides =
            envy::from_iter(vars).context("Failed to read configuration from environment")?;

        if let Some(api_key) = env.exchange_rate_api_key {
            self.api_key = api_key;
        }
        if let Some(base_currency) = env.base_currency {
            self.base_currency = base_currency;
        }
        if let Some(interval) = env.update_interval_seconds {
            self.update_interval_seconds = interval;
        }
        if let Some(host) = env.host {
            self.host = host;
        }
        if let Some(port) = env.port {
            self.port = port;
        }
        if let Some(url) = env.exchange_rate_api_url {
            self.api_base_url = url;
        }
        if let Some(timeout) = env.fetch_timeout_seconds {
            self.fetch_timeout_seconds = timeout;
        }
        if let Some(dir) = env.frontend_dir {
            self.frontend_dir = dir;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.update_interval_seconds > 0,
            "update_interval_seconds must be greater than zero"
        );
        ensure!(
            self.fetch_timeout_seconds > 0,
            "fetch_timeout_seconds must be greater than zero"
        );
        ensure!(
            !self.base_currency.trim().is_empty(),
            "base_currency must not be empty"
        );
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
