//! Application settings: the database, app, logging, and server config groups.

use crate::config::settings::Config;
use crate::config::var::{ConfType, ConfVar};
use crate::error::ConfigError;

pub const DEFAULT_DB_HOST: &str = "local/local.sqlite";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Database settings, read from `DB_*`.
pub fn db_conf() -> Config {
    Config::new([
        ConfVar::typed("user", ConfType::Str),
        ConfVar::typed("password", ConfType::Str),
        ConfVar::typed("name", ConfType::Str),
        ConfVar::with_default("host", DEFAULT_DB_HOST),
        ConfVar::typed("port", ConfType::Str),
        ConfVar::with_default("engine", "sqlite"),
    ])
    .with_prefix("DB")
}

/// App flags, read from `FLASK_DEBUG` and `FLASK_TESTING`.
pub fn app_conf() -> Config {
    Config::new([
        ConfVar::with_default("DEBUG", false),
        ConfVar::with_default("TESTING", false),
    ])
    .with_prefix("FLASK")
}

/// Logging settings, read from `LOG_LEVEL`.
pub fn logging_conf() -> Config {
    Config::new([ConfVar::with_default("LEVEL", "INFO")]).with_prefix("LOG")
}

/// Listener settings, read from `SERVER_BIND`.
pub fn server_conf() -> Config {
    Config::new([ConfVar::with_default("bind", DEFAULT_BIND)]).with_prefix("SERVER")
}

/// All config groups, loaded once at startup and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Settings {
    pub db: Config,
    pub app: Config,
    pub logging: Config,
    pub server: Config,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db: db_conf(),
            app: app_conf(),
            logging: logging_conf(),
            server: server_conf(),
        }
    }
}

impl Settings {
    /// Declared defaults overlaid with the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        settings.db.load_from(&lookup)?;
        settings.app.load_from(&lookup)?;
        settings.logging.load_from(&lookup)?;
        settings.server.load_from(&lookup)?;
        Ok(settings)
    }

    pub fn debug(&self) -> Result<bool, ConfigError> {
        Ok(self.app.get_bool("DEBUG")?.unwrap_or(false))
    }

    pub fn testing(&self) -> Result<bool, ConfigError> {
        Ok(self.app.get_bool("TESTING")?.unwrap_or(false))
    }

    pub fn bind_addr(&self) -> Result<String, ConfigError> {
        Ok(self.server.get_str("bind")?.unwrap_or(DEFAULT_BIND).to_string())
    }

    /// `tracing` filter directives for `LOG_LEVEL`, raised to debug when `FLASK_DEBUG` is on.
    pub fn log_filter(&self) -> Result<String, ConfigError> {
        let raw = self.logging.get_str("LEVEL")?.unwrap_or("INFO");
        let level = if self.debug()? { "debug" } else { tracing_level(raw)? };
        Ok(format!("my_library={level},tower_http={level}"))
    }
}

/// Map Python-style level names onto `tracing` levels.
pub fn tracing_level(raw: &str) -> Result<&'static str, ConfigError> {
    match raw.trim().to_uppercase().as_str() {
        "TRACE" => Ok("trace"),
        "DEBUG" => Ok("debug"),
        "INFO" => Ok("info"),
        "WARN" | "WARNING" => Ok("warn"),
        "ERROR" | "CRITICAL" | "FATAL" => Ok("error"),
        _ => Err(ConfigError::InvalidConfVarValue(format!(
            "LOG_LEVEL: {} is not a known log level",
            raw
        ))),
    }
}

/// Database URI for the `db` config group.
pub fn db_uri(db: &Config) -> Result<String, ConfigError> {
    let engine = db.get_str("engine")?.unwrap_or("sqlite");
    let host = db.get_str("host")?.unwrap_or("");
    Ok(match engine {
        "memory" => "sqlite::memory:".to_string(),
        "sqlite" => format!("sqlite://{}", host),
        _ => format!(
            "{}://{}:{}@{}:{}/{}",
            engine,
            db.get_str("user")?.unwrap_or(""),
            db.get_str("password")?.unwrap_or(""),
            host,
            db.get_str("port")?.unwrap_or(""),
            db.get_str("name")?.unwrap_or(""),
        ),
    })
}

/// [`db_uri`] restricted to the SQLite engines this build can open.
pub fn sqlite_uri(db: &Config) -> Result<String, ConfigError> {
    let uri = db_uri(db)?;
    if uri.starts_with("sqlite:") {
        Ok(uri)
    } else {
        Err(ConfigError::InvalidConfVarValue(format!(
            "DB_ENGINE: {} is not supported, use sqlite or memory",
            db.get_str("engine")?.unwrap_or("")
        )))
    }
}
