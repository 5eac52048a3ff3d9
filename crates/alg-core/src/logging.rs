//! Global tracing subscriber setup

use crate::config::LoggingConfig;
use crate::error::FrameworkError;
use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` when set, else the configured filter
///
/// # Errors
/// `FrameworkError::InvalidConfig` for a malformed configured filter
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, FrameworkError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| FrameworkError::InvalidConfig(format!("logging.filter: {e}")))
}

/// Install the global subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// # Errors
/// - `FrameworkError::InvalidConfig` for a malformed filter
/// - `FrameworkError::Logging` if a global subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<(), FrameworkError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| FrameworkError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_filter_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: "alg_core=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(
            env_filter(&config),
            Err(FrameworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_filter_parses() {
        assert!(env_filter(&LoggingConfig::default()).is_ok());
    }
}
