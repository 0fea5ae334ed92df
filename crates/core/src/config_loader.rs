use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering `config/Config.toml` and
    /// `TRADEHOOK_`-prefixed environment variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from a specific TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value has the
    /// wrong type.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TRADEHOOK_").split("__"))
            .extract()?;

        Ok(config)
    }
}
