//! Builds an `AppConfig` from layered sources with `figment`:
//! `config/base.toml`, then the environment specific file, then environment variables.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::{path::Path, sync::OnceLock};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, CorsConfig, Environment, MailerConfig, NetConfig};

/// Env variable holding the mailing-list provider credential.
pub const API_KEY_ENV: &str = "MAILERLITE_API_KEY";
/// Env variable holding the comma and/or space separated CORS allow-list.
pub const CORS_ALLOW_ORIGIN_ENV: &str = "CORS_ALLOW_ORIGIN";

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<12} - Initializing the configuration",
            "get_or_init_config"
        );
        AppConfig::load().unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

impl AppConfig {
    /// Loads the configuration from the `config` directory in the current working directory.
    /// The environment is selected with `APP_ENVIRONMENT` and defaults to `local`.
    pub fn load() -> ConfigResult<Self> {
        let config_dir = std::env::current_dir()?.join("config");
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;

        Self::load_from(&config_dir, environment)
    }

    pub fn load_from(config_dir: &Path, environment: Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"));

        // Kept as plain strings, `Env` would parse `12345` or `true` into a number or a bool.
        for (var, key) in [
            (API_KEY_ENV, "mailer_config.api_key"),
            (CORS_ALLOW_ORIGIN_ENV, "cors_config.allow_origin"),
        ] {
            if let Some(value) = Env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        let config = figment.extract::<AppConfig>()?;

        reqwest::Url::parse(&config.mailer_config.base_url)
            .map_err(|er| ConfigError::InvalidBaseUrl(er.to_string()))?;

        Ok(config)
    }
}
