//! Configuration sources.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::EmailConfig;

/// Errors raised while fetching configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`EmailConfig`].
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// File that could not be parsed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A provider-specific failure.
    #[error("Configuration unavailable: {0}")]
    Unavailable(String),
}

/// Source of the email configuration record.
///
/// Consulted once, during initialization.
pub trait ConfigProvider: Send + Sync {
    /// Returns the current email configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be obtained.
    fn email_config(&self) -> Result<EmailConfig, ConfigError>;
}

/// Provider backed by an in-memory record.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub EmailConfig);

impl ConfigProvider for StaticConfig {
    fn email_config(&self) -> Result<EmailConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Provider that reads a JSON document from disk on every call.
///
/// The document may be the bare record or an application config with the
/// record under an `"email"` key.
#[derive(Debug, Clone)]
pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    /// Creates a provider for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for JsonFileConfig {
    fn email_config(&self) -> Result<EmailConfig, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        let parse_error = |source: serde_json::Error| ConfigError::Parse {
            path: self.path.clone(),
            source,
        };

        let mut document: serde_json::Value = serde_json::from_str(&raw).map_err(parse_error)?;
        let nested = document
            .as_object_mut()
            .and_then(|fields| fields.remove("email"));
        let record = nested.unwrap_or(document);

        EmailConfig::deserialize(record).map_err(parse_error)
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for std::sync::Arc<P> {
    fn email_config(&self) -> Result<EmailConfig, ConfigError> {
        (**self).email_config()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn static_config_returns_record() {
        let config = EmailConfig {
            host: "smtp.example.com".into(),
            ..EmailConfig::default()
        };
        let provider = StaticConfig(config.clone());
        assert_eq!(provider.email_config().unwrap(), config);
    }

    #[test]
    fn json_file_reads_bare_record() {
        let file = write_json(r#"{"enabled": true, "host": "smtp.example.com", "port": 465}"#);
        let config = JsonFileConfig::new(file.path()).email_config().unwrap();
        assert!(config.enabled);
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 465);
    }

    #[test]
    fn json_file_reads_nested_record() {
        let file = write_json(
            r#"{"logging": {"level": "info"}, "email": {"host": "mx.example.org", "smtp_retry_count": 2}}"#,
        );
        let config = JsonFileConfig::new(file.path()).email_config().unwrap();
        assert_eq!(config.host, "mx.example.org");
        assert_eq!(config.smtp_retry_count, 2);
    }

    #[test]
    fn json_file_bad_nested_field_is_parse_error() {
        let file = write_json(
            r#"{"email": {"enabled": true, "host": "smtp.example.com", "port": "465", "from": "a@b.c"}}"#,
        );
        let err = JsonFileConfig::new(file.path()).email_config().unwrap_err();
        let ConfigError::Parse { source, .. } = &err else {
            panic!("expected parse error, got {err:?}");
        };
        assert!(source.to_string().contains("465"), "{source}");
    }

    #[test]
    fn json_file_bad_bare_field_is_parse_error() {
        let file = write_json(r#"{"host": "smtp.example.com", "smtp_retry_count": "many"}"#);
        let err = JsonFileConfig::new(file.path()).email_config().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn json_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileConfig::new(dir.path().join("absent.json"));
        let err = provider.email_config().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn json_file_malformed_is_parse_error() {
        let file = write_json("{ not json");
        let err = JsonFileConfig::new(file.path()).email_config().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
