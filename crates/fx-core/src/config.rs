//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `fx-gateway.toml` in the working directory
//! 3. Defaults
//!
//! Inside the config file, `${VAR_NAME}` is replaced by the value of the
//! environment variable (or an empty string when it is unset).

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::Error;

/// Default config file looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "fx-gateway.toml";

/// Main configuration for fx-gateway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Webhook server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Messenger platform configuration
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Bank rate feed configuration
    #[serde(default)]
    pub rates: RatesConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the webhook listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Shared secret echoed by Messenger during webhook subscription
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// Page access token for the Send API
    #[serde(default, skip_serializing)]
    pub page_access_token: String,

    /// Graph API base URL
    #[serde(default = "default_messenger_api_url")]
    pub api_url: String,

    /// Register greeting, "Get Started" and the persistent menu on startup
    #[serde(default)]
    pub register_profile: bool,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            verify_token: default_verify_token(),
            page_access_token: String::new(),
            api_url: default_messenger_api_url(),
            register_profile: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// XML exchange rate endpoint
    #[serde(default = "default_rates_url")]
    pub url: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            url: default_rates_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_port() -> u16 {
    8080
}

fn default_verify_token() -> String {
    "GoBot".to_string()
}

fn default_messenger_api_url() -> String {
    "https://graph.facebook.com/v3.1".to_string()
}

fn default_rates_url() -> String {
    "http://www.vietcombank.com.vn/ExchangeRates/ExrateXML.aspx".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Expand `${VAR_NAME}` references with environment variable values.
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// Environment variables still take precedence over file values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut cfg: Config = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        cfg.apply_env_overrides();
        cfg.validate()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Load from `./fx-gateway.toml` when it exists, otherwise from the
    /// environment only.
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            info!("Using config file {}", CONFIG_FILE);
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(token) = std::env::var("MESSENGER_VERIFY_TOKEN") {
            if !token.is_empty() {
                self.messenger.verify_token = token;
            }
        }
        if let Ok(token) = std::env::var("MESSENGER_PAGE_TOKEN") {
            self.messenger.page_access_token = token;
        }
        if let Ok(url) = std::env::var("MESSENGER_API_URL") {
            if !url.is_empty() {
                self.messenger.api_url = url;
            }
        }
        if let Ok(enabled) = std::env::var("MESSENGER_REGISTER_PROFILE") {
            self.messenger.register_profile = enabled.to_lowercase() == "true";
        }

        if let Ok(url) = std::env::var("RATES_URL") {
            if !url.is_empty() {
                self.rates.url = url;
            }
        }

        if let Ok(secs) = std::env::var("HTTP_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.http.timeout_secs = s;
            }
        }
    }

    /// Check that required settings are present
    pub fn validate(&self) -> crate::Result<()> {
        if self.messenger.page_access_token.trim().is_empty() {
            return Err(Error::Config("MESSENGER_PAGE_TOKEN not set".to_string()));
        }
        if self.messenger.verify_token.is_empty() {
            return Err(Error::Config("Messenger verify token is empty".to_string()));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("HTTP timeout must be positive".to_string()));
        }
        Ok(())
    }
}
