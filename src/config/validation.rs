//! Configuration validation.
//!
//! Checks run once at startup; any failure is fatal.

use super::Config;
use crate::error::ConfigError;
use crate::validation::validate_organization_name;

/// Minimum allowed timeout in milliseconds (1 second).
pub const MIN_TIMEOUT_MS: u64 = 1000;

/// Maximum allowed timeout in milliseconds (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if:
/// - the organization name is malformed
/// - the personal access token is blank
/// - `REQUEST_TIMEOUT_MS` is outside 1000..=300000
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_organization_name(&config.organization).map_err(|e| ConfigError::InvalidValue {
        var: "organization".into(),
        reason: e.to_string(),
    })?;

    if config.pat.is_blank() {
        return Err(ConfigError::InvalidValue {
            var: "AZURE_DEVOPS_PAT".into(),
            reason: "must not be empty".into(),
        });
    }

    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&config.request_timeout_ms) {
        return Err(ConfigError::InvalidValue {
            var: "REQUEST_TIMEOUT_MS".into(),
            reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SecretString;

    fn create_valid_config() -> Config {
        Config {
            organization: "contoso".to_string(),
            pat: SecretString::new("pat-123"),
            log_level: "info".to_string(),
            request_timeout_ms: 30_000,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&create_valid_config()).is_ok());
    }

    #[test]
    fn test_bad_organization() {
        let mut config = create_valid_config();
        config.organization = "-contoso".into();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "organization"));
    }

    #[test]
    fn test_blank_pat() {
        let mut config = create_valid_config();
        config.pat = SecretString::new("   ");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "AZURE_DEVOPS_PAT"));
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = create_valid_config();
        config.request_timeout_ms = MIN_TIMEOUT_MS;
        assert!(validate_config(&config).is_ok());
        config.request_timeout_ms = MAX_TIMEOUT_MS;
        assert!(validate_config(&config).is_ok());

        config.request_timeout_ms = MIN_TIMEOUT_MS - 1;
        assert!(validate_config(&config).is_err());
        config.request_timeout_ms = MAX_TIMEOUT_MS + 1;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "REQUEST_TIMEOUT_MS"));
    }
}
