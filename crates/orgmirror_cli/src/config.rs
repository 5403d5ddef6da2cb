//! Configuration file support for orgmirror.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `ORGMIRROR_`, e.g., `ORGMIRROR_DATABASE_URL`)
//! 2. Local config file (./orgmirror.toml)
//! 3. XDG config file (~/.config/orgmirror/config.toml)
//! 4. Built-in defaults
//!
//! A file that fails to parse is an error; nothing falls back to defaults.
//!
//! A `.env` file in the working directory is read into the environment first.
//!
//! The database URL defaults to `sqlite://~/.local/state/orgmirror/orgmirror.db` on Linux
//! (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "postgres:///orgmirror"
//!
//! [github]
//! token = "ghp_..."  # or use ORGMIRROR_GITHUB_TOKEN env var
//! requests_per_second = 10
//!
//! [zenhub]
//! token = "..."  # or use ORGMIRROR_ZENHUB_TOKEN env var
//! requests_per_second = 1
//!
//! [[orgs]]
//! name = "istio"
//!
//! [[orgs]]
//! name = "envoyproxy"
//! repos = ["envoy", "data-plane-api"]
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use orgmirror::rate_limits;
use orgmirror::sync::OrgSpec;
use serde::Deserialize;

const APP_NAME: &str = "orgmirror";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// ZenHub configuration.
    pub zenhub: ZenHubConfig,
    /// Organizations to mirror.
    pub orgs: Vec<OrgSpec>,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via ORGMIRROR_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
    /// Proactive request pacing. File-only: the `_` env separator would split the key.
    pub requests_per_second: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            requests_per_second: rate_limits::GITHUB_DEFAULT_RPS,
        }
    }
}

/// ZenHub configuration. Without a token the pipeline pass is skipped.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ZenHubConfig {
    /// ZenHub API token.
    /// Can also be set via ORGMIRROR_ZENHUB_TOKEN environment variable.
    pub token: Option<String>,
    pub requests_per_second: u32,
}

impl Default for ZenHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            requests_per_second: rate_limits::ZENHUB_DEFAULT_RPS,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` of a file that does not parse or of a value
    /// with the wrong type, naming the offending key.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("orgmirror.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./orgmirror.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., ORGMIRROR_GITHUB_TOKEN -> github.token
        builder.add_source(env_source()).build()?.try_deserialize()
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("orgmirror.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn github_token(&self) -> Option<&str> {
        non_empty(self.github.token.as_deref())
    }

    pub fn zenhub_token(&self) -> Option<&str> {
        non_empty(self.zenhub.token.as_deref())
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/orgmirror` or `~/.local/state/orgmirror`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("ORGMIRROR")
        .separator("_")
        .try_parsing(true)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.requests_per_second, 10);
        assert!(config.zenhub.token.is_none());
        assert_eq!(config.zenhub.requests_per_second, 1);
        assert!(config.orgs.is_empty());
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres:///orgmirror"

            [github]
            token = "ghp_test123"
            requests_per_second = 5

            [zenhub]
            token = "zh"

            [[orgs]]
            name = "istio"

            [[orgs]]
            name = "envoyproxy"
            repos = ["envoy"]
        "#,
        );

        assert_eq!(config.database_url().as_deref(), Some("postgres:///orgmirror"));
        assert_eq!(config.github_token(), Some("ghp_test123"));
        assert_eq!(config.github.requests_per_second, 5);
        assert_eq!(config.zenhub_token(), Some("zh"));
        assert_eq!(config.zenhub.requests_per_second, 1);

        assert_eq!(config.orgs.len(), 2);
        assert_eq!(config.orgs[0].name, "istio");
        assert!(config.orgs[0].repos.is_empty());
        assert_eq!(config.orgs[1].repos, ["envoy"]);
    }

    #[test]
    fn test_blank_tokens_are_absent() {
        let config = from_toml(
            r#"
            [github]
            token = "  "
        "#,
        );
        assert_eq!(config.github_token(), None);
        assert_eq!(config.zenhub_token(), None);
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        if let Some(url) = config.database_url() {
            assert!(url.starts_with("sqlite://"));
            assert!(url.ends_with("orgmirror.db?mode=rwc"));
        }
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_x"
            enterprise = true

            [metrics]
            port = 9090
        "#,
        );
        assert_eq!(config.github_token(), Some("ghp_x"));
    }

    #[test]
    fn test_mistyped_value_is_an_error() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\nrequests_per_second = \"fast\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Config>();

        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[github\ntoken = ", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\ntoken = \"from-file\"\n",
                FileFormat::Toml,
            ))
            .add_source(
                env_source().source(Some(
                    [("ORGMIRROR_GITHUB_TOKEN".to_string(), "from-env".to_string())]
                        .into_iter()
                        .collect(),
                )),
            )
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.github_token(), Some("from-env"));
    }
}
