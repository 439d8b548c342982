//! Error types for the Azure DevOps MCP Server.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`ValidationError`]: Caller-supplied input rejected before any I/O
//! - [`RateLimitExceeded`]: Outbound call ceiling breached
//! - [`ApiError`]: Azure DevOps REST API failures
//! - [`McpError`]: MCP protocol / transport errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use thiserror::Error;

/// Top-level application error.
///
/// This is the main error type returned by public API functions.
/// Validation, rate limit and API errors are displayed verbatim so the
/// reason reaches the tool caller unchanged.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input validation error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rate limit error.
    #[error(transparent)]
    RateLimit(#[from] RateLimitExceeded),

    /// Azure DevOps API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// MCP protocol error.
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Returns true if the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit(_) => true,
            Self::Api(e) => e.is_retryable(),
            Self::Validation(_) | Self::Mcp(_) | Self::Config(_) => false,
        }
    }
}

/// Input validation errors.
///
/// Raised synchronously before any network call. Never retried; the
/// caller must supply corrected input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was empty.
    #[error("{field} is required")]
    Required {
        /// Human-readable field label.
        field: String,
    },

    /// A string exceeded its length limit.
    #[error("{field} too long (max {max} characters)")]
    TooLong {
        /// Human-readable field label.
        field: String,
        /// Maximum allowed length in characters.
        max: usize,
    },

    /// A path identifier contained a traversal sequence.
    #[error("Invalid {field}: path traversal sequences are not allowed")]
    PathTraversal {
        /// Human-readable field label.
        field: String,
    },

    /// A numeric identifier was not a positive integer.
    #[error("Invalid {field}")]
    InvalidId {
        /// Human-readable field label.
        field: String,
    },

    /// A numeric identifier exceeded the 32-bit signed range.
    #[error("{field} too large")]
    IdTooLarge {
        /// Human-readable field label.
        field: String,
    },

    /// A value did not match its allowed format.
    #[error("Invalid {field} format: {reason}")]
    InvalidFormat {
        /// Human-readable field label.
        field: String,
        /// What the format requires.
        reason: String,
    },
}

/// The per-client outbound call ceiling was breached.
///
/// Retryable by the caller once the window rolls over; no automatic
/// backoff is performed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Rate limit exceeded ({limit} requests per {window_ms}ms). \
     Please wait {retry_after_ms}ms before making more requests."
)]
pub struct RateLimitExceeded {
    /// Configured ceiling per window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Milliseconds until the current window rolls over.
    pub retry_after_ms: u64,
}

/// Azure DevOps REST API errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("{status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the canonical status reason.
        message: String,
    },

    /// No response was received.
    #[error("No response from server: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Request timed out.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The response body could not be interpreted.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what was unexpected.
        message: String,
    },

    /// The request could not be built.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what's invalid.
        message: String,
    },
}

impl ApiError {
    /// Returns true if this error is retryable.
    ///
    /// Throttling, server-side failures, timeouts and network errors are
    /// retryable. Client errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::UnexpectedResponse { .. } | Self::InvalidRequest { .. } => false,
        }
    }

    /// Returns true if the API rejected the credentials.
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 203, .. })
    }
}

/// MCP protocol errors.
///
/// These errors represent failures in MCP JSON-RPC communication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum McpError {
    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    // Type assertions - verify all errors implement required traits
    assert_impl_all!(AppError: Send, Sync, std::error::Error);
    assert_impl_all!(ValidationError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(RateLimitExceeded: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(ApiError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(McpError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(ConfigError: Send, Sync, std::error::Error, Clone);

    #[test]
    fn test_app_error_validation_is_transparent() {
        let err = AppError::Validation(ValidationError::InvalidId {
            field: "work item ID".to_string(),
        });
        assert_eq!(err.to_string(), "Invalid work item ID");
    }

    #[test]
    fn test_app_error_api_is_transparent() {
        let err = AppError::Api(ApiError::Http {
            status: 404,
            message: "Not Found".to_string(),
        });
        assert_eq!(err.to_string(), "404: Not Found");
    }

    #[test]
    fn test_app_error_display_config() {
        let err = AppError::Config(ConfigError::MissingRequired {
            var: "AZURE_DEVOPS_PAT".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required: AZURE_DEVOPS_PAT"
        );
    }

    #[test]
    fn test_app_error_display_mcp() {
        let err = AppError::Mcp(McpError::Internal {
            message: "stdio closed".to_string(),
        });
        assert_eq!(err.to_string(), "MCP protocol error: Internal error: stdio closed");
    }

    #[test]
    fn test_app_error_from_conversions() {
        let app: AppError = ValidationError::Required {
            field: "Project name".into(),
        }
        .into();
        assert!(matches!(app, AppError::Validation(_)));

        let app: AppError = RateLimitExceeded {
            limit: 100,
            window_ms: 60_000,
            retry_after_ms: 10,
        }
        .into();
        assert!(matches!(app, AppError::RateLimit(_)));

        let app: AppError = ApiError::Timeout { timeout_ms: 1 }.into();
        assert!(matches!(app, AppError::Api(_)));

        let app: AppError = ConfigError::MissingRequired { var: "X".into() }.into();
        assert!(matches!(app, AppError::Config(_)));
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::Required {
                field: "Project name".into()
            }
            .to_string(),
            "Project name is required"
        );
        assert_eq!(
            ValidationError::TooLong {
                field: "Title".into(),
                max: 255
            }
            .to_string(),
            "Title too long (max 255 characters)"
        );
        assert_eq!(
            ValidationError::IdTooLarge {
                field: "Work item ID".into()
            }
            .to_string(),
            "Work item ID too large"
        );
    }

    #[test]
    fn test_rate_limit_message_includes_wait() {
        let err = RateLimitExceeded {
            limit: 100,
            window_ms: 60_000,
            retry_after_ms: 1_500,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Rate limit exceeded"));
        assert!(msg.contains("1500ms"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::RateLimit(RateLimitExceeded {
            limit: 1,
            window_ms: 1,
            retry_after_ms: 1
        })
        .is_retryable());
        assert!(ApiError::Http {
            status: 503,
            message: "Service Unavailable".into()
        }
        .is_retryable());
        assert!(ApiError::Http {
            status: 429,
            message: "Too Many Requests".into()
        }
        .is_retryable());
        assert!(!ApiError::Http {
            status: 400,
            message: "Bad Request".into()
        }
        .is_retryable());
        assert!(!AppError::Validation(ValidationError::InvalidId { field: "id".into() })
            .is_retryable());
    }

    #[test]
    fn test_authentication_failure_detection() {
        assert!(ApiError::Http {
            status: 401,
            message: "Unauthorized".into()
        }
        .is_authentication_failure());
        assert!(!ApiError::Network {
            message: "refused".into()
        }
        .is_authentication_failure());
    }
}
