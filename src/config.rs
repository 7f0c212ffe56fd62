use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CONFIG_FILE_NAME: &str = "followbot.toml";

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    pub listing: Option<ListingConfig>,
    pub throttle: Option<ThrottleConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token; prompted for when empty
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub per_page: Option<u32>,
}

/// Fixed pauses between API calls, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub page_delay_ms: Option<u64>,
    pub follow_delay_ms: Option<u64>,
    pub skip_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            timeout_secs: Some(10),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: Some(100),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: Some(1000),
            follow_delay_ms: Some(2000),
            skip_delay_ms: Some(500),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        // Status lines go to stdout; keep log noise off the console by default
        Self {
            level: Some("warn".to_string()),
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }
}

impl ThrottleConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms.unwrap_or(1000))
    }

    pub fn follow_delay(&self) -> Duration {
        Duration::from_millis(self.follow_delay_ms.unwrap_or(2000))
    }

    pub fn skip_delay(&self) -> Duration {
        Duration::from_millis(self.skip_delay_ms.unwrap_or(500))
    }
}

impl Config {
    /// Load configuration from TOML file with XDG directory support and environment variable overrides
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("config file not found: {}", path.display()),
                    )));
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_file {
            Some(path) => {
                tracing::debug!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                toml::from_str::<Config>(&content)?
            }
            None => {
                tracing::debug!("No config file found, using environment variables only");
                Config::default()
            }
        };

        config.apply_env_overrides()?;

        if config.listing.is_none() {
            config.listing = Some(ListingConfig::default());
        }
        if config.throttle.is_none() {
            config.throttle = Some(ThrottleConfig::default());
        }
        if config.logging.is_none() {
            config.logging = Some(LoggingConfig::default());
        }

        config.validate()?;

        Ok(config)
    }

    /// Look in the current directory first, then in the user config directory
    fn find_config_file() -> Option<PathBuf> {
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Some(current_dir_config);
        }

        let xdg_config = env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .map(|dir| dir.join("followbot").join(CONFIG_FILE_NAME))?;

        xdg_config.exists().then_some(xdg_config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // GitHub configuration
        if let Ok(token) = env::var("FOLLOWBOT_GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Ok(api_url) = env::var("FOLLOWBOT_GITHUB_API_URL") {
            self.github.api_url = api_url;
        }
        if let Ok(timeout) = env::var("FOLLOWBOT_GITHUB_TIMEOUT_SECS") {
            self.github.timeout_secs = Some(timeout.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "FOLLOWBOT_GITHUB_TIMEOUT_SECS must be a valid number".to_string(),
                )
            })?);
        }

        // Listing configuration
        if let Ok(per_page) = env::var("FOLLOWBOT_PER_PAGE") {
            let listing = self.listing.get_or_insert_with(ListingConfig::default);
            listing.per_page = Some(per_page.parse().map_err(|_| {
                ConfigError::InvalidValue("FOLLOWBOT_PER_PAGE must be a valid number".to_string())
            })?);
        }

        // Throttle configuration
        if let Ok(page_ms) = env::var("FOLLOWBOT_THROTTLE_PAGE_MS") {
            let throttle = self.throttle.get_or_insert_with(ThrottleConfig::default);
            throttle.page_delay_ms = Some(page_ms.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "FOLLOWBOT_THROTTLE_PAGE_MS must be a valid number".to_string(),
                )
            })?);
        }
        if let Ok(follow_ms) = env::var("FOLLOWBOT_THROTTLE_FOLLOW_MS") {
            let throttle = self.throttle.get_or_insert_with(ThrottleConfig::default);
            throttle.follow_delay_ms = Some(follow_ms.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "FOLLOWBOT_THROTTLE_FOLLOW_MS must be a valid number".to_string(),
                )
            })?);
        }
        if let Ok(skip_ms) = env::var("FOLLOWBOT_THROTTLE_SKIP_MS") {
            let throttle = self.throttle.get_or_insert_with(ThrottleConfig::default);
            throttle.skip_delay_ms = Some(skip_ms.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "FOLLOWBOT_THROTTLE_SKIP_MS must be a valid number".to_string(),
                )
            })?);
        }

        // Logging configuration
        if let Ok(level) = env::var("FOLLOWBOT_LOG_LEVEL") {
            let logging = self.logging.get_or_insert_with(LoggingConfig::default);
            logging.level = Some(level);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.github.api_url.is_empty() {
            return Err(ConfigError::MissingRequired(
                "github.api_url or FOLLOWBOT_GITHUB_API_URL".to_string(),
            ));
        }

        Url::parse(&self.github.api_url).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "github.api_url '{}' is not a valid URL: {e}",
                self.github.api_url
            ))
        })?;

        if self.github.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "github.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(per_page) = self.listing.as_ref().and_then(|l| l.per_page) {
            if !(1..=100).contains(&per_page) {
                return Err(ConfigError::InvalidValue(
                    "listing.per_page must be between 1 and 100".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn listing(&self) -> ListingConfig {
        self.listing.clone().unwrap_or_default()
    }

    pub fn throttle(&self) -> ThrottleConfig {
        self.throttle.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Followers requested per page, capped by the API at 100
    pub fn per_page(&self) -> u32 {
        self.listing().per_page.unwrap_or(100)
    }
}
