//! Server types and shared state.

use std::sync::Arc;

use crate::config::Config;
use crate::devops::DevOpsClient;

/// Shared application state for all tool handlers.
///
/// Cloning is cheap; every clone talks through the same client and so
/// shares one rate limiter.
#[derive(Clone)]
pub struct AppState {
    /// Azure DevOps client.
    pub client: Arc<DevOpsClient>,
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub fn new(client: DevOpsClient, config: Config) -> Self {
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::devops::ClientConfig;
    use static_assertions::assert_impl_all;

    assert_impl_all!(AppState: Clone, Send, Sync);

    fn config() -> Config {
        Config {
            organization: "contoso".to_string(),
            pat: SecretString::new("secret-pat"),
            log_level: "info".to_string(),
            request_timeout_ms: 30_000,
        }
    }

    #[test]
    fn test_app_state_debug_redacts_pat() {
        let client = DevOpsClient::new("secret-pat", ClientConfig::for_organization("contoso")).unwrap();
        let state = AppState::new(client, config());
        let debug = format!("{state:?}");
        assert!(debug.contains("AppState"));
        assert!(debug.contains("contoso"));
        assert!(!debug.contains("secret-pat"));
    }

    #[test]
    fn test_clones_share_rate_limiter() {
        let client = DevOpsClient::new("pat", ClientConfig::for_organization("contoso")).unwrap();
        let state = AppState::new(client, config());
        let other = state.clone();
        assert!(Arc::ptr_eq(
            state.client.rate_limiter(),
            other.client.rate_limiter()
        ));
    }
}
