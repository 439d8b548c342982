//! Redacting wrapper for the personal access token.

use std::fmt;

/// A string whose value never appears in `Debug` or `Display` output.
///
/// Holds the Azure DevOps personal access token so that logging a
/// [`Config`](super::Config) cannot leak it.
///
/// # Example
///
/// ```
/// use azure_devops_mcp::config::SecretString;
///
/// let pat = SecretString::new("abcd1234pat");
/// assert_eq!(format!("{pat:?}"), "<REDACTED>");
/// assert_eq!(pat.expose(), "abcd1234pat");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret. Only call this where the value is sent on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
