//! Configuration management.
//!
//! This module handles:
//! - Organization selection (command line first, then environment)
//! - Personal access token loading via [`SecretString`]
//! - Optional tuning variables with defaults
//! - Validation (see [`validate_config`])
//!
//! # Example
//!
//! ```
//! use azure_devops_mcp::config::{Config, SecretString};
//!
//! let config = Config {
//!     organization: "contoso".to_string(),
//!     pat: SecretString::new("example-pat"),
//!     log_level: "info".to_string(),
//!     request_timeout_ms: 30_000,
//! };
//!
//! let debug = format!("{config:?}");
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("example-pat"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{validate_config, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

use crate::error::ConfigError;

/// Environment variable naming the organization.
pub const ORG_ENV_VAR: &str = "AZURE_DEVOPS_ORG";

/// Primary environment variable holding the personal access token.
pub const PAT_ENV_VAR: &str = "AZURE_DEVOPS_PAT";

/// Fallback token variable, shared with the Azure CLI DevOps extension.
pub const PAT_FALLBACK_ENV_VAR: &str = "AZURE_DEVOPS_EXT_PAT";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Application configuration.
///
/// Built once in `main` and passed down; nothing else reads the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Azure DevOps organization name (`https://dev.azure.com/{organization}`).
    pub organization: String,
    /// Personal access token (protected from logging via [`SecretString`]).
    pub pat: SecretString,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// Per-request HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the command line argument and environment.
    ///
    /// `org_arg` is the first positional argument, if any. It takes
    /// precedence over `AZURE_DEVOPS_ORG`.
    ///
    /// Environment variables:
    /// - `AZURE_DEVOPS_ORG`: organization, when no argument is given
    /// - `AZURE_DEVOPS_PAT` (or `AZURE_DEVOPS_EXT_PAT`): personal access token
    /// - `LOG_LEVEL`: logging level (default: `info`)
    /// - `REQUEST_TIMEOUT_MS`: HTTP timeout (default: `30000`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - no organization is given
    /// - no token variable is set
    /// - `REQUEST_TIMEOUT_MS` is not a positive integer
    /// - any value fails validation (see [`validate_config`])
    pub fn load(org_arg: Option<String>) -> Result<Self, ConfigError> {
        let organization = org_arg
            .filter(|org| !org.is_empty())
            .or_else(|| std::env::var(ORG_ENV_VAR).ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: format!("organization (argument or {ORG_ENV_VAR})"),
            })?;

        let pat = std::env::var(PAT_ENV_VAR)
            .or_else(|_| std::env::var(PAT_FALLBACK_ENV_VAR))
            .map_err(|_| ConfigError::MissingRequired {
                var: PAT_ENV_VAR.into(),
            })?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());
        let request_timeout_ms = parse_env_u64("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;

        let config = Self {
            organization,
            pat: SecretString::new(pat),
            log_level,
            request_timeout_ms,
        };

        validate_config(&config)?;
        Ok(config)
    }
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}
