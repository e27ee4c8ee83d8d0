//! Configuration loader and validator.
//!
//! Settings come from an optional YAML file; credentials and channel ids may
//! also come from the environment (or a `.env` file), which takes precedence.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::notify::{ntfy, Priority};

pub const DEFAULT_PATH: &str = "config.yaml";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
    pub notify: Notify,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    /// Send query failures as an error notification instead of aborting.
    pub notify_on_error: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            notify_on_error: true,
        }
    }
}

/// Notion API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Notion {
    pub token: String,
    pub version: String,
    pub database_id: String,
}

impl Default for Notion {
    fn default() -> Self {
        Self {
            token: String::new(),
            version: DEFAULT_NOTION_VERSION.to_string(),
            database_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Ntfy,
    Pushover,
}

/// Push notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Notify {
    pub backend: Backend,
    pub title: String,
    pub priority: Priority,
    pub ntfy: Ntfy,
    pub pushover: Pushover,
}

impl Default for Notify {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            title: "Fridge Alert".to_string(),
            priority: Priority::High,
            ntfy: Ntfy::default(),
            pushover: Pushover::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Ntfy {
    pub server: String,
    pub topic: String,
}

impl Default for Ntfy {
    fn default() -> Self {
        Self {
            server: DEFAULT_NTFY_SERVER.to_string(),
            topic: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pushover {
    pub token: String,
    pub user: String,
}

/// Which sections must be complete for the calling binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Notion and the notification channel (daily check).
    Full,
    /// Notion only (leftovers CLI, schema inspection).
    NotionOnly,
}

impl Config {
    /// Overlay environment values on top of the file contents.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("NOTION_TOKEN") {
            self.notion.token = v;
        }
        if let Some(v) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = v;
        }
        if let Some(v) = get("NOTION_VERSION") {
            self.notion.version = v;
        }
        if let Some(v) = get("NTFY_SERVER") {
            self.notify.ntfy.server = v;
        }
        if let Some(v) = get("NTFY_TOPIC") {
            self.notify.ntfy.topic = v;
        }
        if let Some(v) = get("PUSHOVER_TOKEN") {
            self.notify.pushover.token = v;
        }
        if let Some(v) = get("PUSHOVER_USER") {
            self.notify.pushover.user = v;
        }
    }
}

/// Load configuration from a YAML file and the process environment, then
/// validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory
///   and tolerates its absence.
pub fn load(path: Option<&Path>, scope: Scope) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    load_with_env(path, scope, |key| std::env::var(key).ok())
}

/// Same as [`load`] with an explicit environment lookup.
pub fn load_with_env<F>(path: Option<&Path>, scope: Scope, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(path) => parse(&fs::read_to_string(path)?)?,
        None if Path::new(DEFAULT_PATH).exists() => {
            parse(&fs::read_to_string(DEFAULT_PATH)?)?
        }
        None => Config::default(),
    };
    cfg.apply_env(env);
    validate(&cfg, scope)?;
    Ok(cfg)
}

fn parse(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config, scope: Scope) -> Result<(), ConfigError> {
    if cfg.notion.token.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "notion.token must be non-empty (or set NOTION_TOKEN)",
        ));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty"));
    }
    if cfg.notion.database_id.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "notion.database_id must be non-empty (or set NOTION_DATABASE_ID)",
        ));
    }

    if scope == Scope::NotionOnly {
        return Ok(());
    }

    if cfg.notify.title.trim().is_empty() {
        return Err(ConfigError::Invalid("notify.title must be non-empty"));
    }
    match cfg.notify.backend {
        Backend::Ntfy => {
            if reqwest::Url::parse(&cfg.notify.ntfy.server).is_err() {
                return Err(ConfigError::Invalid("notify.ntfy.server must be a valid URL"));
            }
            if cfg.notify.ntfy.topic.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notify.ntfy.topic must be non-empty (or set NTFY_TOPIC)",
                ));
            }
            if !ntfy::is_valid_topic(cfg.notify.ntfy.topic.trim()) {
                return Err(ConfigError::Invalid(
                    "notify.ntfy.topic must be 1-64 characters of letters, digits, '-' or '_'",
                ));
            }
        }
        Backend::Pushover => {
            if cfg.notify.pushover.token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notify.pushover.token must be non-empty (or set PUSHOVER_TOKEN)",
                ));
            }
            if cfg.notify.pushover.user.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notify.pushover.user must be non-empty (or set PUSHOVER_USER)",
                ));
            }
        }
    }

    Ok(())
}

/// Sample configuration file.
pub fn example() -> &'static str {
    r#"app:
  # Send query failures to the phone instead of just exiting non-zero.
  notify_on_error: true

notion:
  token: "YOUR_NOTION_INTEGRATION_TOKEN"
  version: "2022-06-28"
  database_id: "NOTION_LEFTOVERS_DATABASE_ID"

notify:
  backend: ntfy        # or: pushover
  title: "Fridge Alert"
  priority: high       # min | low | default | high | urgent
  ntfy:
    server: "https://ntfy.sh/"
    topic: "my-fridge-alerts"
  pushover:
    token: "YOUR_PUSHOVER_APP_TOKEN"
    user: "YOUR_PUSHOVER_USER_KEY"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn example_config() -> Config {
        serde_yaml::from_str(example()).unwrap()
    }

    #[test]
    fn parse_example_ok() {
        let cfg = example_config();
        validate(&cfg, Scope::Full).unwrap();
        assert_eq!(cfg.notify.backend, Backend::Ntfy);
        assert_eq!(cfg.notify.priority, Priority::High);
        assert!(cfg.app.notify_on_error);
    }

    #[test]
    fn missing_notion_token() {
        let mut cfg = example_config();
        cfg.notion.token = "  ".into();
        let err = validate(&cfg, Scope::NotionOnly).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("notion.token")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn missing_database_id() {
        let mut cfg = example_config();
        cfg.notion.database_id = "".into();
        let err = validate(&cfg, Scope::Full).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("database_id")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn missing_channel_only_matters_for_full_scope() {
        let mut cfg = example_config();
        cfg.notify.ntfy.topic = "".into();
        assert!(validate(&cfg, Scope::NotionOnly).is_ok());
        let err = validate(&cfg, Scope::Full).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("ntfy.topic")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn pushover_requires_token_and_user() {
        let mut cfg = example_config();
        cfg.notify.backend = Backend::Pushover;
        cfg.notify.pushover.user = "".into();
        assert!(matches!(
            validate(&cfg, Scope::Full),
            Err(ConfigError::Invalid(msg)) if msg.contains("pushover.user")
        ));

        cfg.notify.pushover.token = "".into();
        assert!(matches!(
            validate(&cfg, Scope::Full),
            Err(ConfigError::Invalid(msg)) if msg.contains("pushover.token")
        ));
    }

    #[test]
    fn ntfy_topic_must_be_a_plain_name() {
        for topic in ["alerts:home", "/other", "a?b"] {
            let mut cfg = example_config();
            cfg.notify.ntfy.topic = topic.into();
            assert!(matches!(
                validate(&cfg, Scope::Full),
                Err(ConfigError::Invalid(msg)) if msg.contains("ntfy.topic")
            ));
        }
    }

    #[test]
    fn invalid_ntfy_server() {
        let mut cfg = example_config();
        cfg.notify.ntfy.server = "not a url".into();
        assert!(matches!(validate(&cfg, Scope::Full), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_file() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let env: HashMap<&str, &str> = [
            ("NOTION_TOKEN", "secret_env"),
            ("NTFY_TOPIC", "env-topic"),
            ("PUSHOVER_USER", ""),
        ]
        .into_iter()
        .collect();
        let cfg = load_with_env(Some(p.as_path()), Scope::Full, |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(cfg.notion.token, "secret_env");
        assert_eq!(cfg.notify.ntfy.topic, "env-topic");
        assert_eq!(cfg.notify.pushover.user, "YOUR_PUSHOVER_USER_KEY");
        assert_eq!(cfg.notion.database_id, "NOTION_LEFTOVERS_DATABASE_ID");
    }

    #[test]
    fn env_alone_is_enough() {
        let td = tempdir().unwrap();
        let p = td.path().join("empty.yaml");
        fs::write(&p, "").unwrap();
        let cfg = load_with_env(Some(p.as_path()), Scope::Full, |k| match k {
            "NOTION_TOKEN" => Some("t".into()),
            "NOTION_DATABASE_ID" => Some("db".into()),
            "NTFY_TOPIC" => Some("topic".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.notion.version, DEFAULT_NOTION_VERSION);
        assert_eq!(cfg.notify.ntfy.server, DEFAULT_NTFY_SERVER);
        assert_eq!(cfg.notify.title, "Fridge Alert");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(
            &p,
            "notion:\n  token: t\n  database_id: db\nnotify:\n  backend: pushover\n  pushover:\n    token: a\n    user: u\n",
        )
        .unwrap();
        let cfg = load_with_env(Some(p.as_path()), Scope::Full, no_env).unwrap();
        assert_eq!(cfg.notify.backend, Backend::Pushover);
        assert_eq!(cfg.notify.priority, Priority::High);
        assert_eq!(cfg.notion.version, DEFAULT_NOTION_VERSION);
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("nope.yaml");
        let err = load_with_env(Some(p.as_path()), Scope::Full, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
