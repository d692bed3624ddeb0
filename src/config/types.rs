//! The configuration structs used to build the AppConfig, and their impls.
use lazy_regex::regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub mailer_config: MailerConfig,
    #[serde(default)]
    pub cors_config: CorsConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Settings for the mailing-list provider.
/// The `api_key` is optional on purpose: a missing key is reported per request, not at start-up.
#[derive(Deserialize, Clone, Debug)]
pub struct MailerConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub group_id: String,
    pub timeout_millis: u64,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origin: Option<String>,
}

// ###################################
// ->   IMPLs
// ###################################
impl MailerConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }

    /// Returns the API key only if it is present and not blank.
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .cloned()
    }
}

impl CorsConfig {
    /// Splits the raw allow-list on commas and/or whitespace, dropping empty entries.
    pub fn allowed_origins(&self) -> Vec<String> {
        let raw = self.allow_origin.as_deref().unwrap_or_default().trim();

        regex!(r"[,\s]+")
            .split(raw)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> ConfigResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}
