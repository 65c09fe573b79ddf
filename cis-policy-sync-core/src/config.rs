//! Runtime configuration.
//!
//! Loaded from a JSON file with optional `rhacs`, `policies` and `logging`
//! sections. Every field has a default except the Central URL and API token,
//! which are checked when connection settings are resolved.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::{PolicySyncError, PolicySyncResult};

pub const DEFAULT_CATALOG_FILE: &str = "cis_policies.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rhacs: RhacsConfig,
    pub policies: PoliciesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RhacsConfig {
    pub central_url: Option<String>,
    pub api_token: Option<String>,
    pub insecure_skip_tls_verify: bool,
    pub timeout_secs: u64,
}

impl Default for RhacsConfig {
    fn default() -> Self {
        Self {
            central_url: None,
            api_token: None,
            insecure_skip_tls_verify: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for RhacsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RhacsConfig")
            .field("central_url", &self.central_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoliciesConfig {
    /// Catalog path. Relative paths are resolved against the config file's directory.
    pub config_file: PathBuf,
    pub skip_existing: bool,
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CATALOG_FILE),
            skip_existing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level. Also accepts the `WARNING` and `CRITICAL`
    /// spellings used by older config files.
    pub fn level_filter(&self) -> PolicySyncResult<LevelFilter> {
        parse_level(&self.level)
    }
}

/// Parse a log level name into a [`LevelFilter`].
pub fn parse_level(level: &str) -> PolicySyncResult<LevelFilter> {
    let normalized = match level.trim().to_ascii_uppercase().as_str() {
        "WARNING" => "WARN".to_string(),
        "CRITICAL" | "FATAL" => "ERROR".to_string(),
        other => other.to_string(),
    };
    LevelFilter::from_str(&normalized)
        .map_err(|_| PolicySyncError::config(format!("unknown log level '{level}'")))
}

/// Validated settings needed to talk to Central.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub central_url: String,
    pub api_token: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("central_url", &self.central_url)
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> PolicySyncResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PolicySyncError::io(path, e))?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            PolicySyncError::config(format!("invalid JSON in '{}': {e}", path.display()))
        })?;

        if config.policies.config_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.policies.config_file = dir.join(&config.policies.config_file);
            }
        }
        Ok(config)
    }

    /// Resolve connection settings, failing if the URL or token is absent.
    pub fn connection_settings(&self) -> PolicySyncResult<ConnectionSettings> {
        let central_url = non_empty(self.rhacs.central_url.as_deref()).ok_or_else(|| {
            PolicySyncError::config("RHACS central_url must be provided")
        })?;
        let api_token = non_empty(self.rhacs.api_token.as_deref())
            .ok_or_else(|| PolicySyncError::config("RHACS api_token must be provided"))?;
        if self.rhacs.timeout_secs == 0 {
            return Err(PolicySyncError::config("timeout_secs must be greater than zero"));
        }

        Ok(ConnectionSettings {
            central_url: central_url.to_string(),
            api_token: api_token.to_string(),
            timeout: Duration::from_secs(self.rhacs.timeout_secs),
            accept_invalid_certs: self.rhacs.insecure_skip_tls_verify,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.policies.skip_existing);
        assert_eq!(
            config.policies.config_file,
            PathBuf::from(DEFAULT_CATALOG_FILE)
        );
        assert_eq!(config.rhacs.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.rhacs.insecure_skip_tls_verify);
        assert_eq!(config.logging.level, "INFO");
    }

    #[test]
    fn test_load_resolves_catalog_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "rhacs": {"central_url": "https://central.example.com", "api_token": "tok"},
                "policies": {"config_file": "policies/cis.json", "skip_existing": false},
                "logging": {"level": "DEBUG", "format": "%(message)s"}
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(
            config.policies.config_file,
            dir.path().join("policies/cis.json")
        );
        assert!(!config.policies.skip_existing);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_load_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(PolicySyncError::Config(_))
        ));
    }

    #[test]
    fn test_connection_settings_require_url_and_token() {
        let mut config = AppConfig::default();
        let err = config.connection_settings().unwrap_err();
        assert!(err.to_string().contains("central_url"), "got: {err}");

        config.rhacs.central_url = Some("https://central.example.com".into());
        config.rhacs.api_token = Some("   ".into());
        let err = config.connection_settings().unwrap_err();
        assert!(err.to_string().contains("api_token"), "got: {err}");

        config.rhacs.api_token = Some("secret-token".into());
        let settings = config.connection_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(!format!("{settings:?}").contains("secret-token"));
    }

    #[test]
    fn test_insecure_flag_reaches_connection_settings() {
        let config: AppConfig = serde_json::from_str(
            r#"{"rhacs": {"central_url": "https://central.example.com", "api_token": "tok",
                          "insecure_skip_tls_verify": true, "timeout_secs": 12}}"#,
        )
        .unwrap();
        let settings = config.connection_settings().unwrap();
        assert!(settings.accept_invalid_certs);
        assert_eq!(settings.timeout, Duration::from_secs(12));
    }

    #[rstest]
    #[case("info", LevelFilter::Info)]
    #[case("WARNING", LevelFilter::Warn)]
    #[case("CRITICAL", LevelFilter::Error)]
    #[case("trace", LevelFilter::Trace)]
    #[case("off", LevelFilter::Off)]
    fn test_parse_level(#[case] raw: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_level(raw).unwrap(), expected);
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        assert!(matches!(parse_level("LOUD"), Err(PolicySyncError::Config(_))));
    }
}
