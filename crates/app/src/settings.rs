//! Handles settings for the application. Configuration is read from
//! `settings.toml` and overridden by `COMPTOIR__*` environment variables,
//! e.g. `COMPTOIR__SERVER__PORT=8080`.
//!
//! ```toml
//! [app]
//! level = "info"
//! timezone = "Africa/Abidjan"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "comptoir.db" }
//! enforce_subscription = true
//! webhook_secret = "change-me"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
    /// IANA zone used to cut statistics days.
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub enforce_subscription: bool,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("app.timezone", "Africa/Abidjan")?
            .set_default("server.port", 3000)?
            .set_default("server.database", "memory")?
            .set_default("server.enforce_subscription", true)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("COMPTOIR").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
