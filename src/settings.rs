use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Which storage implementation backs the server.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A Postgres database reached through `database.url`.
    Postgres,
    /// A process-local store. Everything is lost on restart.
    Memory,
}

/// This configuration object contains the database config.
#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    /// Storage backend.
    #[serde(default = "default_backend")]
    pub backend: Backend,
    /// Database url.
    pub url: String,
    /// Maximum number of connections to the database.
    pub max_connections: u32,
}

fn default_backend() -> Backend {
    Backend::Postgres
}

/// This configuration object contains the authentication config.
#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    /// Secret used to sign session tokens.
    pub secret: String,
    /// Lifetime of a session, in hours.
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    /// Only send the session cookie over https.
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_hours() -> i64 {
    24
}

/// The signing secret shipped in `config/default.toml`.
pub const DEVELOPMENT_SECRET: &str = "development-secret-change-me-before-deploying";

impl Auth {
    /// True while the shipped development secret signs sessions.
    pub fn uses_development_secret(&self) -> bool {
        self.secret == DEVELOPMENT_SECRET
    }
}

/// The app wide settings
#[derive(Debug, Deserialize, Clone)]
pub struct BaseSettings {
    /// The URL the application is being served from.
    pub url: String,
    /// Socket address the server listens on.
    pub listen: String,
    /// The rust log parameter. Describes how much logging is wanted.
    pub rust_log: Option<String>,
}

/// This structure contains all the config parameters of the app.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Settings related to the database.
    pub database: Database,
    /// Authentication config.
    pub auth: Auth,
    /// The app-wide config.
    pub base: BaseSettings,
}

impl Settings {
    /// Creates a new configuration form config files and environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(".env").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("sheet")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        s.try_deserialize()
    }

    /// Reads the configuration from a single TOML document.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_default_config_file() {
        let settings = Settings::from_toml(include_str!("../config/default.toml")).unwrap();
        assert_eq!(settings.database.backend, Backend::Postgres);
        assert_eq!(settings.auth.session_hours, 24);
        assert!(!settings.auth.secure_cookie);
        assert!(settings.auth.secret.len() >= 32);
        assert!(settings.auth.uses_development_secret());
    }

    #[test]
    fn should_fill_in_optional_values() {
        let settings = Settings::from_toml(
            r#"
            [database]
            backend = "memory"
            url = ""
            max_connections = 1

            [auth]
            secret = "0123456789abcdef0123456789abcdef"

            [base]
            url = "http://localhost"
            listen = "127.0.0.1:0"
            "#,
        )
        .unwrap();
        assert_eq!(settings.database.backend, Backend::Memory);
        assert_eq!(settings.auth.session_hours, 24);
        assert!(!settings.auth.secure_cookie);
        assert!(settings.base.rust_log.is_none());
        assert!(!settings.auth.uses_development_secret());
    }

    #[test]
    fn should_reject_unknown_backend() {
        let result = Settings::from_toml(
            r#"
            [database]
            backend = "mongo"
            url = ""
            max_connections = 1

            [auth]
            secret = "x"

            [base]
            url = ""
            listen = ""
            "#,
        );
        assert!(result.is_err());
    }
}
