//! Azure DevOps client configuration.
//!
//! Azure DevOps serves different API families from different hosts. The
//! core host carries projects, work items, git, builds, test plans and
//! wikis; release management, search and test results each have their own.

/// Core REST host.
pub const DEFAULT_HOST: &str = "https://dev.azure.com";
/// Release management host.
pub const RELEASE_HOST: &str = "https://vsrm.dev.azure.com";
/// Search host.
pub const SEARCH_HOST: &str = "https://almsearch.dev.azure.com";
/// Test results host.
pub const TEST_RESULTS_HOST: &str = "https://vstmr.dev.azure.com";
/// Default `api-version` query value.
pub const DEFAULT_API_VERSION: &str = "7.0";
/// Default timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Which API family a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// `dev.azure.com`
    Core,
    /// `vsrm.dev.azure.com`
    Release,
    /// `almsearch.dev.azure.com`
    Search,
    /// `vstmr.dev.azure.com`
    TestResults,
}

/// Client configuration for the Azure DevOps REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Organization-scoped core URL, e.g. `https://dev.azure.com/contoso`.
    pub base_url: String,
    /// Organization-scoped release management URL.
    pub release_base_url: String,
    /// Organization-scoped search URL.
    pub search_base_url: String,
    /// Organization-scoped test results URL.
    pub test_results_base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Default `api-version` for endpoints that don't pin their own.
    pub api_version: String,
}

impl ClientConfig {
    /// Creates a configuration for the given organization on the public cloud.
    #[must_use]
    pub fn for_organization(organization: &str) -> Self {
        Self {
            base_url: format!("{DEFAULT_HOST}/{organization}"),
            release_base_url: format!("{RELEASE_HOST}/{organization}"),
            search_base_url: format!("{SEARCH_HOST}/{organization}"),
            test_results_base_url: format!("{TEST_RESULTS_HOST}/{organization}"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Routes every API family through one URL.
    ///
    /// Useful behind a gateway, and in tests against a single mock server.
    #[must_use]
    pub fn with_single_host(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            release_base_url: base_url.clone(),
            search_base_url: base_url.clone(),
            test_results_base_url: base_url.clone(),
            base_url,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the core URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the release management URL.
    #[must_use]
    pub fn with_release_base_url(mut self, url: impl Into<String>) -> Self {
        self.release_base_url = url.into();
        self
    }

    /// Set timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the default `api-version`.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Returns the organization-scoped URL for an API family.
    #[must_use]
    pub fn host_url(&self, host: Host) -> &str {
        match host {
            Host::Core => &self.base_url,
            Host::Release => &self.release_base_url,
            Host::Search => &self.search_base_url,
            Host::TestResults => &self.test_results_base_url,
        }
    }
}
