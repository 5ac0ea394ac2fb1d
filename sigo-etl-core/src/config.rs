//! Configuration for the SIGO ETL pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment.
//! The CLI applies its flags on top of the extracted value.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Name of the workspace-level configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "sigo-etl.toml";

/// Prefix for environment overrides (`SIGO_ETL_SOURCE__ENDPOINT`, ...).
pub const ENV_PREFIX: &str = "SIGO_ETL_";

/// Top-level configuration for an ETL run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where occurrences are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Occurrence endpoint of the SIGO backend.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token. Takes precedence over `token_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Whole-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// TCP connect timeout (seconds).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// Resolve the bearer token from the explicit value or the configured env var.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        let usable = |t: &String| !t.trim().is_empty();
        self.token
            .clone()
            .filter(usable)
            .or_else(|| std::env::var(&self.token_env).ok().filter(usable))
            .ok_or_else(|| ConfigError::MissingToken {
                env_var: self.token_env.clone(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_endpoint() -> String {
    "http://localhost:3000/analysis/occurrence".to_string()
}

fn default_token_env() -> String {
    "SIGO_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Where and how the star schema is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, created if absent.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Field delimiter for the CSV files.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Also write `dashboard_data.json`.
    #[serde(default = "default_true")]
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            delimiter: default_delimiter(),
            write_summary: true,
        }
    }
}

impl OutputConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

impl EtlConfig {
    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.source.endpoint).map_err(|e| {
            ConfigError::invalid(format!(
                "source.endpoint '{}' is not a valid URL: {e}",
                self.source.endpoint
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(format!(
                "source.endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.source.timeout_secs == 0 || self.source.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid("source timeouts must be greater than zero"));
        }
        if matches!(self.output.delimiter, '"' | '\n' | '\r') {
            return Err(ConfigError::invalid(format!(
                "output.delimiter {:?} is not allowed",
                self.output.delimiter
            )));
        }
        Ok(())
    }

    /// Copy of the configuration with the token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.source.token.is_some() {
            config.source.token = Some("********".to_string());
        }
        config
    }
}

/// Location of the user-level configuration file, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("br", "sigo", "sigo-etl")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `SIGO_ETL_`, nested with `__`)
/// 2. Explicit config file (`--config`)
/// 3. Workspace config (`<workspace>/sigo-etl.toml`)
/// 4. User config (`~/.config/sigo-etl/config.toml` on Linux)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<EtlConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(EtlConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // An explicit file must exist; a typo should not silently fall back to defaults.
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file_exact(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EtlConfig::default();
        assert_eq!(
            config.source.endpoint,
            "http://localhost:3000/analysis/occurrence"
        );
        assert_eq!(config.source.token_env, "SIGO_API_TOKEN");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.output.dir, PathBuf::from("data/processed"));
        assert_eq!(config.output.delimiter, ',');
        assert!(config.output.write_summary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = EtlConfig::default();
        config.output.delimiter = ';';
        config.source.token = Some("abc".into());
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: EtlConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            r#"
[source]
endpoint = "https://sigo.example.org/analysis/occurrence"
timeout_secs = 5

[output]
dir = "out"
write_summary = false
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(
            config.source.endpoint,
            "https://sigo.example.org/analysis/occurrence"
        );
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.source.connect_timeout_secs, 10);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(!config.output.write_summary);
    }

    #[test]
    fn test_explicit_file_overrides_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            "[output]\ndir = \"from-workspace\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "[output]\ndir = \"from-explicit\"\n").unwrap();

        let config = load_config(Some(dir.path()), Some(&explicit)).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("from-explicit"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(None, Some(&missing)).is_err());
    }

    #[test]
    fn test_resolve_token_prefers_explicit_value() {
        let source = SourceConfig {
            token: Some("secret".into()),
            token_env: "SIGO_ETL_TEST_UNSET_TOKEN_VAR".into(),
            ..SourceConfig::default()
        };
        assert_eq!(source.resolve_token().unwrap(), "secret");
    }

    #[test]
    fn test_resolve_token_missing() {
        let source = SourceConfig {
            token: Some("   ".into()),
            token_env: "SIGO_ETL_TEST_UNSET_TOKEN_VAR".into(),
            ..SourceConfig::default()
        };
        let err = source.resolve_token().unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken { .. }));
    }

    #[test]
    fn test_blank_explicit_token_falls_back_to_env() {
        const VAR: &str = "SIGO_ETL_TEST_BLANK_FALLBACK_TOKEN";
        // SAFETY: the variable is unique to this test.
        unsafe { std::env::set_var(VAR, "from-env") };
        let source = SourceConfig {
            token: Some(String::new()),
            token_env: VAR.into(),
            ..SourceConfig::default()
        };
        let token = source.resolve_token();
        unsafe { std::env::remove_var(VAR) };
        assert_eq!(token.unwrap(), "from-env");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EtlConfig::default();
        config.source.endpoint = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = EtlConfig::default();
        config.source.endpoint = "ftp://host/file".into();
        assert!(config.validate().is_err());

        let mut config = EtlConfig::default();
        config.source.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EtlConfig::default();
        config.output.delimiter = '"';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_masks_token() {
        let mut config = EtlConfig::default();
        config.source.token = Some("super-secret".into());
        let shown = config.redacted();
        assert_eq!(shown.source.token.as_deref(), Some("********"));
        assert_eq!(config.source.token.as_deref(), Some("super-secret"));
    }
}
