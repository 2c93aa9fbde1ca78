//! Settings file model, environment overrides and validation

use mpsiem_client::{Connection, HttpClientConfig};
use mpsiem_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiemConfig {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SIEM core endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Core hostname, without scheme or path
    #[serde(default)]
    pub hostname: String,

    /// Bearer token (supports env var syntax: $VAR_NAME or ${VAR_NAME})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_scheme")]
    pub scheme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_false")]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            access_token: None,
            scheme: default_scheme(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_retries: 0,
            accept_invalid_certs: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SiemConfig {
    /// Read a settings file
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if the file doesn't exist
    /// - `Error::Io` if it can't be read
    /// - `Error::Config` if it isn't valid YAML/TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_tilde(path.as_ref())?;

        if !path.exists() {
            return Err(Error::ConfigNotFound);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read config file: {}", e);
            Error::Io(e)
        })?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|e| {
                error!("Failed to parse TOML config: {}", e);
                Error::Config(format!("Invalid TOML: {}", e))
            })?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents).map_err(|e| {
                error!("Failed to parse YAML config: {}", e);
                Error::Config(format!("Invalid YAML: {}", e))
            })?
        };

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("MPSIEM_CORE_HOSTNAME") {
            self.core.hostname = val;
        }

        if let Ok(val) = std::env::var("MPSIEM_ACCESS_TOKEN") {
            self.core.access_token = Some(val);
        }

        if let Ok(val) = std::env::var("MPSIEM_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.http.connection_timeout_secs = secs,
                Err(_) => warn!("Invalid MPSIEM_TIMEOUT_SECS '{}', keeping {}", val, self.http.connection_timeout_secs),
            }
        }

        if let Ok(val) = std::env::var("MPSIEM_MAX_RETRIES") {
            match val.parse::<u32>() {
                Ok(retries) => self.http.max_retries = retries,
                Err(_) => warn!("Invalid MPSIEM_MAX_RETRIES '{}', keeping {}", val, self.http.max_retries),
            }
        }

        if let Ok(val) = std::env::var("MPSIEM_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Replace `$VAR_NAME` / `${VAR_NAME}` references with their values
    pub fn resolve_env_vars(&mut self) -> Result<()> {
        if let Some(token) = self.core.access_token.as_deref() {
            self.core.access_token = Some(resolve_env_var(token)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let hostname = self.core.hostname.trim();
        if hostname.is_empty() {
            return Err(Error::Config("'core.hostname' is required".to_string()));
        }
        if hostname.contains("://") || hostname.contains('/') {
            return Err(Error::Config(format!(
                "'core.hostname' must be a bare host name, got '{}'",
                hostname
            )));
        }

        if !matches!(self.core.scheme.as_str(), "http" | "https") {
            return Err(Error::Config(format!(
                "'core.scheme' must be 'http' or 'https', got '{}'",
                self.core.scheme
            )));
        }

        if self.http.connection_timeout_secs == 0 {
            return Err(Error::Config(
                "'http.connection_timeout_secs' must be greater than 0".to_string(),
            ));
        }

        debug!("Config validation passed");
        Ok(())
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout_secs: self.http.connection_timeout_secs,
            connect_timeout_secs: self.http.connect_timeout_secs,
            max_retries: self.http.max_retries,
            accept_invalid_certs: self.http.accept_invalid_certs,
            ..Default::default()
        }
    }

    /// Open a connection to the configured core
    pub fn connection(&self) -> Result<Connection> {
        let hostname = self.core.hostname.trim();
        let connection = Connection::new(
            hostname,
            self.http_client_config(),
            self.core.access_token.as_deref(),
        )?;

        Ok(if self.core.scheme == "https" {
            connection
        } else {
            let base_url = format!("{}://{}", self.core.scheme, hostname);
            connection.with_base_url(base_url)
        })
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string())),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Resolve a single environment variable reference
/// Supports: $VAR_NAME or ${VAR_NAME}
/// If no $ prefix, returns value as-is
fn resolve_env_var(value: &str) -> Result<String> {
    let trimmed = value.trim();

    if let Some(var_name) = trimmed.strip_prefix('$') {
        let var_name = var_name
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(var_name);

        std::env::var(var_name)
            .map_err(|_| Error::Config(format!("Environment variable not found: {}", var_name)))
    } else {
        Ok(value.to_string())
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn config_with_host(hostname: &str) -> SiemConfig {
        let mut config = SiemConfig::default();
        config.core.hostname = hostname.to_string();
        config
    }

    #[test]
    fn test_file_not_found() {
        let result = SiemConfig::from_file("/nonexistent/mpsiem.yaml");
        assert!(matches!(result, Err(Error::ConfigNotFound)));
    }

    #[test]
    fn test_read_yaml_config() {
        let temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        std::fs::write(
            temp_file.path(),
            r#"
core:
  hostname: siem.example.local
  access_token: secret
http:
  connection_timeout_secs: 30
  max_retries: 2
logging:
  level: debug
"#,
        )
        .unwrap();

        let config = SiemConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.core.hostname, "siem.example.local");
        assert_eq!(config.core.access_token.as_deref(), Some("secret"));
        assert_eq!(config.core.scheme, "https");
        assert_eq!(config.http.connection_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_read_toml_config() {
        let temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        std::fs::write(
            temp_file.path(),
            r#"
[core]
hostname = "siem.example.local"
scheme = "http"

[http]
accept_invalid_certs = true
"#,
        )
        .unwrap();

        let config = SiemConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.core.hostname, "siem.example.local");
        assert_eq!(config.core.scheme, "http");
        assert!(config.http.accept_invalid_certs);
        assert_eq!(config.http.connection_timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        std::fs::write(temp_file.path(), "core: [unclosed").unwrap();

        let result = SiemConfig::from_file(temp_file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial_test::serial]
    fn test_merge_env_overrides_file_values() {
        unsafe {
            std::env::set_var("MPSIEM_CORE_HOSTNAME", "env.siem.local");
            std::env::set_var("MPSIEM_TIMEOUT_SECS", "15");
            std::env::set_var("MPSIEM_MAX_RETRIES", "not-a-number");
            std::env::set_var("MPSIEM_ACCESS_TOKEN", "env-token");
            std::env::set_var("MPSIEM_LOG_LEVEL", "debug");
        }

        let mut config = config_with_host("file.siem.local");
        config.merge_env();

        assert_eq!(config.core.hostname, "env.siem.local");
        assert_eq!(config.http.connection_timeout_secs, 15);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.core.access_token.as_deref(), Some("env-token"));
        assert_eq!(config.logging.level, "debug");

        unsafe {
            std::env::remove_var("MPSIEM_CORE_HOSTNAME");
            std::env::remove_var("MPSIEM_TIMEOUT_SECS");
            std::env::remove_var("MPSIEM_MAX_RETRIES");
            std::env::remove_var("MPSIEM_ACCESS_TOKEN");
            std::env::remove_var("MPSIEM_LOG_LEVEL");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_access_token_from_env() {
        unsafe {
            std::env::set_var("TEST_MPSIEM_TOKEN_123", "token-value");
        }

        let mut config = config_with_host("siem.local");
        config.core.access_token = Some("${TEST_MPSIEM_TOKEN_123}".to_string());
        config.resolve_env_vars().unwrap();
        assert_eq!(config.core.access_token.as_deref(), Some("token-value"));

        config.core.access_token = Some("$TEST_MPSIEM_TOKEN_123".to_string());
        config.resolve_env_vars().unwrap();
        assert_eq!(config.core.access_token.as_deref(), Some("token-value"));

        unsafe {
            std::env::remove_var("TEST_MPSIEM_TOKEN_123");
        }
    }

    #[test]
    fn test_resolve_missing_env_var() {
        let mut config = config_with_host("siem.local");
        config.core.access_token = Some("$NONEXISTENT_MPSIEM_VAR_XYZ".to_string());

        let err = config.resolve_env_vars().unwrap_err();
        assert!(err.to_string().contains("NONEXISTENT_MPSIEM_VAR_XYZ"));
    }

    #[test]
    fn test_literal_token_is_kept() {
        let mut config = config_with_host("siem.local");
        config.core.access_token = Some("literal-token".to_string());
        config.resolve_env_vars().unwrap();
        assert_eq!(config.core.access_token.as_deref(), Some("literal-token"));
    }

    #[test]
    fn test_validate() {
        assert!(config_with_host("siem.local").validate().is_ok());

        assert!(SiemConfig::default().validate().is_err());
        assert!(config_with_host("https://siem.local").validate().is_err());
        assert!(config_with_host("siem.local/api").validate().is_err());

        let mut bad_scheme = config_with_host("siem.local");
        bad_scheme.core.scheme = "ftp".to_string();
        assert!(bad_scheme.validate().is_err());

        let mut zero_timeout = config_with_host("siem.local");
        zero_timeout.http.connection_timeout_secs = 0;
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_connection_from_config() {
        let config = config_with_host("siem.local");
        let connection = config.connection().unwrap();
        assert_eq!(connection.base_url(), "https://siem.local");
        assert_eq!(connection.config().timeout_secs, 60);

        let mut plain = config_with_host("127.0.0.1:8080");
        plain.core.scheme = "http".to_string();
        plain.http.connection_timeout_secs = 5;
        let connection = plain.connection().unwrap();
        assert_eq!(connection.base_url(), "http://127.0.0.1:8080");
        assert_eq!(connection.hostname(), "127.0.0.1:8080");
        assert_eq!(connection.config().timeout_secs, 5);
    }

    #[test]
    fn test_expand_tilde() {
        let plain = expand_tilde(Path::new("/etc/mpsiem.yaml")).unwrap();
        assert_eq!(plain, PathBuf::from("/etc/mpsiem.yaml"));

        if let Some(home) = dirs::home_dir() {
            let expanded = expand_tilde(Path::new("~/.mpsiem/config.yaml")).unwrap();
            assert_eq!(expanded, home.join(".mpsiem/config.yaml"));
        }
    }
}
