//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` in the working directory and can be overridden
//! with `WALLET__<SECTION>__<KEY>` environment variables, e.g.
//! `WALLET__SERVER__PORT=8080`.
//!
//! See `settings.toml` for an example.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Throwaway in-memory SQLite database.
    Memory,
    /// SQLite database file, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("WALLET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
