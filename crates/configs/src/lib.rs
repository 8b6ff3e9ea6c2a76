//! # configs
//!
//! Layered runtime settings: built-in defaults, then an optional
//! `config/postboard.toml`, then `POSTBOARD__SECTION__KEY` environment
//! variables (a `.env` file is read first, if present).
//!
//! ```text
//! POSTBOARD__SERVER__PORT=8080
//! POSTBOARD__DATABASE__URL=postgres://localhost/postboard
//! POSTBOARD__AUTH__JWT_SECRET=change-me
//! POSTBOARD__FEED__VALID_TAGS=general,events,housing
//! ```

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/postboard.toml";

const ENV_PREFIX: &str = "POSTBOARD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub feed: FeedSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// `["*"]` allows any origin; empty disables CORS headers entirely.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Unset means the process runs against the in-memory store.
    #[serde(deserialize_with = "optional_secret")]
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    #[serde(deserialize_with = "secret")]
    pub jwt_secret: SecretString,
    pub token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(String::new()),
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub max_page_size: u32,
    pub post_cooldown_secs: u64,
    /// Empty keeps the feed's built-in tag set.
    pub valid_tags: Vec<String>,
    pub max_title_chars: usize,
    pub max_text_chars: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            max_page_size: 50,
            post_cooldown_secs: 60,
            valid_tags: Vec::new(),
            max_title_chars: 100,
            max_text_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// An `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info,tower_http=debug,sqlx=warn".into(),
            format: LogFormat::Pretty,
        }
    }
}

fn secret<'de, D: Deserializer<'de>>(de: D) -> Result<SecretString, D::Error> {
    String::deserialize(de).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(de: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(de)?
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("feed.valid_tags")
        .with_list_parse_key("server.allowed_origins")
        .try_parsing(true)
}

impl Settings {
    /// Loads from `.env`, [`DEFAULT_CONFIG_FILE`] and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if let Ok(dotenv) = dotenvy::dotenv() {
            tracing::debug!(path = %dotenv.display(), "loaded .env");
        }
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment());
        Self::assemble(builder)
    }

    fn assemble(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let feed = &self.feed;
        if feed.max_page_size == 0 {
            return Err(invalid("feed.max_page_size", "must be at least 1"));
        }
        if feed.valid_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("feed.valid_tags", "tags must not be blank"));
        }
        if feed.max_title_chars == 0 || feed.max_text_chars == 0 {
            return Err(invalid("feed.max_*_chars", "limits must be non-zero"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        if cfg!(feature = "auth-jwt") && self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(invalid("auth.jwt_secret", "must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::collections::HashMap;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Settings::assemble(builder)
    }

    const MINIMAL: &str = r#"
        [auth]
        jwt_secret = "s3cret"
    "#;

    #[test]
    fn defaults_fill_missing_sections() {
        let settings = from_toml(MINIMAL).unwrap();
        assert_eq!(settings.server.bind_addr(), "0.0.0.0:8080");
        assert!(settings.database.url.is_none());
        assert_eq!(settings.feed.max_page_size, 50);
        assert_eq!(settings.feed.post_cooldown_secs, 60);
        assert_eq!(settings.feed.max_title_chars, 100);
        assert_eq!(settings.feed.max_text_chars, 2000);
        assert!(settings.feed.valid_tags.is_empty());
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert_eq!(settings.auth.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 9000
            allowed_origins = ["https://example.org"]

            [database]
            url = "postgres://localhost/postboard"

            [auth]
            jwt_secret = "s3cret"
            token_ttl_secs = 60

            [feed]
            max_page_size = 20
            valid_tags = ["news"]

            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.allowed_origins, ["https://example.org"]);
        assert_eq!(
            settings.database.url.as_ref().map(|u| u.expose_secret().to_owned()),
            Some("postgres://localhost/postboard".to_owned())
        );
        assert_eq!(settings.feed.max_page_size, 20);
        assert_eq!(settings.feed.valid_tags, ["news"]);
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn environment_lists_are_split_on_commas() {
        let vars = HashMap::from([
            ("POSTBOARD__AUTH__JWT_SECRET".to_string(), "env-secret".to_string()),
            ("POSTBOARD__FEED__VALID_TAGS".to_string(), "alpha,beta".to_string()),
            ("POSTBOARD__FEED__MAX_PAGE_SIZE".to_string(), "5".to_string()),
        ]);
        let builder = Config::builder().add_source(environment().source(Some(vars)));
        let settings = Settings::assemble(builder).unwrap();
        assert_eq!(settings.feed.valid_tags, ["alpha", "beta"]);
        assert_eq!(settings.feed.max_page_size, 5);
        assert_eq!(settings.auth.jwt_secret.expose_secret(), "env-secret");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = from_toml(&format!("{MINIMAL}\n[feed]\nmax_page_size = 0\n")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "feed.max_page_size",
                ..
            }
        ));
    }

    #[test]
    fn empty_tag_set_is_accepted() {
        let settings = from_toml(&format!("{MINIMAL}\n[feed]\nvalid_tags = []\n")).unwrap();
        assert!(settings.feed.valid_tags.is_empty());
    }

    #[test]
    fn blank_tag_entry_is_rejected() {
        let err = from_toml(&format!(
            "{MINIMAL}\n[feed]\nvalid_tags = [\"general\", \" \"]\n"
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "feed.valid_tags",
                ..
            }
        ));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let settings = from_toml(&format!("{MINIMAL}\n[database]\nurl = \"  \"\n")).unwrap();
        assert!(settings.database.url.is_none());
    }

    #[cfg(feature = "auth-jwt")]
    #[test]
    fn missing_jwt_secret_is_rejected() {
        let err = from_toml("").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "auth.jwt_secret",
                ..
            }
        ));
    }
}
