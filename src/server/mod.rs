//! MCP server implementation.
//!
//! This module provides:
//! - Tool definitions with rmcp macros ([`DevOpsServer`])
//! - Tool parameter types with JSON schemas
//! - Stdio transport
//!
//! # Architecture
//!
//! Every tool is a thin adapter: parameters go to a
//! [`DevOpsClient`](crate::devops::DevOpsClient) operation and the typed
//! response is rendered as text. Tool groups:
//!
//! - **Projects**: `list_projects`, `get_project`
//! - **Work items**: `list_work_items` and the `wit_*` tools
//! - **Repositories**: `list_pull_requests`, `create_pull_request`,
//!   `update_pull_request_status`, `list_branches` and the `repo_*` tools
//! - **Builds**: `run_build`, `get_build_status`, `list_build_definitions`
//! - **Search**: `search_code`, `wit_search_work_items`
//! - **Test plans**: plans, suites, cases, runs and results
//! - **Releases**: definitions, releases and deployments
//! - **Wikis**: list, read, create and update pages
//! - **Iterations and areas**: list and create
//!
//! # Example
//!
//! ```no_run
//! use azure_devops_mcp::config::{Config, SecretString};
//! use azure_devops_mcp::server::McpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     organization: "contoso".to_string(),
//!     pat: SecretString::new("example-pat"),
//!     log_level: "info".to_string(),
//!     request_timeout_ms: 30_000,
//! };
//! McpServer::new(config).run_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod format;
mod mcp;
mod params;
mod tools;
mod transport;
mod types;

pub use mcp::McpServer;
pub use params::{
    AddCommentParams, AddTestCasesParams, BuildParams, CreateAreaParams, CreateIterationParams,
    CreatePullRequestParams, CreateReleaseParams, CreateTestCaseParams, CreateTestPlanParams,
    CreateTestSuiteParams, CreateWikiPageParams, CreateWorkItemParams, DeployReleaseParams,
    GetBranchParams, GetProjectParams, GetRepositoryParams, IterationWorkItemsParams,
    LinkWorkItemsParams, ListPullRequestsParams, ListReleasesParams, ListTestPlansParams,
    ListWorkItemsParams, ProjectParams, PullRequestParams, ReplyToCommentParams,
    RepositoryParams, RunBuildParams, RunQueryParams, RunTestCaseParams, SearchParams,
    SuiteParams, TestRunParams, ThreadParams, UpdatePullRequestStatusParams,
    UpdateWikiPageParams, UpdateWorkItemParams, WikiPageParams, WorkItemIdParams,
};
pub use tools::DevOpsServer;
pub use transport::StdioTransport;
pub use types::AppState;
