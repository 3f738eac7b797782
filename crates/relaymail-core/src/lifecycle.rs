//! One-shot service initialization.
//!
//! ```text
//! Uninitialized ──initialize()──┬──► Ready(settings)
//!                               └──► Failed(error)
//! ```
//!
//! The first caller runs setup; concurrent callers block until the outcome
//! is published, and every later caller observes that same outcome.

use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crate::config::{ConfigError, ConfigProvider, Settings};
use crate::validation::ValidationError;

/// Reasons initialization can fail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InitError {
    /// A required collaborator was not supplied.
    #[error("{0} has not been set")]
    MissingCollaborator(&'static str),

    /// The configuration provider failed.
    #[error("Getting email config: {0}")]
    Config(#[source] Arc<ConfigError>),

    /// The configuration is invalid; the service stays disabled.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Observable lifecycle state.
#[derive(Debug, Clone)]
pub enum ServiceState {
    /// `initialize` has not completed.
    Uninitialized,
    /// Setup succeeded.
    Ready(Arc<Settings>),
    /// Setup failed; the service is disabled.
    Failed(InitError),
}

impl ServiceState {
    /// Returns true if the service is ready and enabled in configuration.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Ready(settings) if settings.is_enabled())
    }
}

/// Runs setup at most once and stores its outcome.
#[derive(Debug, Default)]
pub struct Lifecycle {
    outcome: OnceLock<Result<Arc<Settings>, InitError>>,
}

impl Lifecycle {
    /// Creates an uninitialized lifecycle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
        }
    }

    /// Runs setup on the first call and returns the stored outcome.
    ///
    /// # Errors
    ///
    /// Returns the setup error: a missing provider, a provider failure, or a
    /// validation failure. The same error is returned on every later call.
    pub fn initialize(
        &self,
        provider: Option<&dyn ConfigProvider>,
    ) -> Result<Arc<Settings>, InitError> {
        self.outcome.get_or_init(|| setup(provider)).clone()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        match self.outcome.get() {
            None => ServiceState::Uninitialized,
            Some(Ok(settings)) => ServiceState::Ready(Arc::clone(settings)),
            Some(Err(e)) => ServiceState::Failed(e.clone()),
        }
    }

    /// Returns the settings if setup succeeded.
    #[must_use]
    pub fn settings(&self) -> Option<&Arc<Settings>> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().ok())
    }
}

fn setup(provider: Option<&dyn ConfigProvider>) -> Result<Arc<Settings>, InitError> {
    let provider = provider.ok_or(InitError::MissingCollaborator("config provider"))?;

    let config = provider.email_config().map_err(|e| {
        error!(error = %e, "getting email config failed");
        InitError::Config(Arc::new(e))
    })?;

    let settings = Settings::from_config(config).map_err(|e| {
        error!(field = e.field(), error = %e, "invalid email config, service disabled");
        InitError::Validation(e)
    })?;

    info!(
        enabled = settings.is_enabled(),
        addr = settings.addr(),
        dial_timeout = ?settings.dial_timeout(),
        attempts = settings.retry_policy().attempts,
        "email service initialized"
    );
    Ok(Arc::new(settings))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{EmailConfig, StaticConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        config: EmailConfig,
    }

    impl ConfigProvider for Counting {
        fn email_config(&self) -> Result<EmailConfig, ConfigError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.config.clone())
        }
    }

    struct Unavailable;

    impl ConfigProvider for Unavailable {
        fn email_config(&self) -> Result<EmailConfig, ConfigError> {
            Err(ConfigError::Unavailable("settings store locked".into()))
        }
    }

    fn valid() -> EmailConfig {
        EmailConfig {
            enabled: true,
            host: "smtp.example.com".into(),
            port: 465,
            from: "station@example.com".into(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn starts_uninitialized() {
        let lifecycle = Lifecycle::new();
        assert!(matches!(lifecycle.state(), ServiceState::Uninitialized));
        assert!(!lifecycle.state().is_enabled());
        assert!(lifecycle.settings().is_none());
    }

    #[test]
    fn ready_after_valid_config() {
        let lifecycle = Lifecycle::new();
        let provider = StaticConfig(valid());
        let settings = lifecycle.initialize(Some(&provider)).unwrap();
        assert_eq!(settings.addr(), "smtp.example.com:465");
        assert!(lifecycle.state().is_enabled());
    }

    #[test]
    fn ready_but_disabled() {
        let lifecycle = Lifecycle::new();
        let provider = StaticConfig(EmailConfig {
            enabled: false,
            ..valid()
        });
        lifecycle.initialize(Some(&provider)).unwrap();
        assert!(matches!(lifecycle.state(), ServiceState::Ready(_)));
        assert!(!lifecycle.state().is_enabled());
    }

    #[test]
    fn missing_provider() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.initialize(None).unwrap_err();
        assert!(matches!(err, InitError::MissingCollaborator(_)));
        assert_eq!(err.to_string(), "config provider has not been set");
    }

    #[test]
    fn provider_error_is_wrapped() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.initialize(Some(&Unavailable)).unwrap_err();
        assert!(matches!(err, InitError::Config(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("settings store locked"));
    }

    #[test]
    fn validation_failure_disables_service() {
        let lifecycle = Lifecycle::new();
        let provider = StaticConfig(EmailConfig {
            from: String::new(),
            ..valid()
        });
        let err = lifecycle.initialize(Some(&provider)).unwrap_err();
        assert!(matches!(
            err,
            InitError::Validation(ValidationError::EmptyFrom)
        ));
        assert!(matches!(lifecycle.state(), ServiceState::Failed(_)));
        assert!(!lifecycle.state().is_enabled());
        assert!(lifecycle.settings().is_none());
    }

    #[test]
    fn outcome_is_sticky() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.initialize(None).is_err());

        // A later call with a usable provider does not re-run setup.
        let provider = StaticConfig(valid());
        let err = lifecycle.initialize(Some(&provider)).unwrap_err();
        assert!(matches!(err, InitError::MissingCollaborator(_)));
    }

    #[test]
    fn concurrent_initialize_runs_setup_once() {
        let lifecycle = Lifecycle::new();
        let provider = Counting {
            calls: AtomicUsize::new(0),
            config: valid(),
        };

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let settings = lifecycle.initialize(Some(&provider)).unwrap();
                    assert!(settings.is_enabled());
                });
            }
        });

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        lifecycle.initialize(Some(&provider)).unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
