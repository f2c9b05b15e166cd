use config::{Config, Environment};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
    pub address: String,
    pub port: u16,
    pub debug: bool,
}

impl ApiSettings {
    pub fn try_from_env() -> Result<Self, config::ConfigError> {
        Self::build(Environment::with_prefix("CVEDB").prefix_separator("_"))
    }

    fn build(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("address", "127.0.0.1")?
            .set_default("port", 5000)?
            .set_default("debug", false)?
            .add_source(environment)
            .build()?
            .try_deserialize::<Self>()
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Location of the SQLite store.
    pub path: String,
}

impl DatabaseSettings {
    pub fn try_from_env() -> Result<Self, config::ConfigError> {
        Self::build(Environment::with_prefix("DB").prefix_separator("_"))
    }

    fn build(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("path", "data.db")?
            .add_source(environment)
            .build()?
            .try_deserialize::<Self>()
    }
}
