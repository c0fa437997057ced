use crate::errors::ClientError;
use home_config::HomeConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://app.datadoghq.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Credentials {
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct CredentialsConfig {
    pub api_key: Option<String>,
    pub app_key: Option<String>,
}

pub fn credentials_file() -> HomeConfig {
    HomeConfig::with_config_dir("dogapi", "credentials")
}

pub fn load_credentials() -> Option<CredentialsConfig> {
    match credentials_file().toml::<Credentials>() {
        Ok(v) => Some(v.credentials),
        Err(e) => {
            log::debug!("no credentials file loaded: {:?}", e);
            None
        }
    }
}

#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    app_key: String,
    api_base: String,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: &str, app_key: &str) -> Self {
        ClientConfig {
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Environment first, then the credentials file for any key still missing.
    pub fn load() -> Result<Self, ClientError> {
        Self::resolve(
            |name| env::var(name).ok(),
            load_credentials().unwrap_or_default(),
        )
    }

    fn resolve<F>(lookup: F, file: CredentialsConfig) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("DATADOG_API_KEY")
            .or(file.api_key)
            .ok_or(ClientError::MissingCredential("api_key"))?;
        let app_key = lookup("DATADOG_APP_KEY")
            .or(file.app_key)
            .ok_or(ClientError::MissingCredential("app_key"))?;
        let api_base = lookup("DATADOG_HOST").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout = match lookup("DATADOG_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(0) => {
                    log::warn!("ignoring DATADOG_TIMEOUT_SECS={:?}: must be positive", v);
                    DEFAULT_TIMEOUT_SECS
                }
                Ok(secs) => secs,
                Err(e) => {
                    log::warn!("ignoring DATADOG_TIMEOUT_SECS={:?}: {}", v, e);
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(ClientConfig {
            api_key,
            app_key,
            api_base,
            timeout: Duration::from_secs(timeout),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
    pub fn app_key(&self) -> &str {
        &self.app_key
    }
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}
