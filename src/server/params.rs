//! Tool parameter types.
//!
//! One struct per tool input shape. Field names are camelCase on the
//! wire and every struct derives `JsonSchema` so rmcp can publish the
//! input schema. Numeric identifiers arrive as JSON numbers and are
//! kept as `f64` until the client validates them.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

// ============================================================================
// Shared shapes
// ============================================================================

/// A project name.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParams {
    /// Project name.
    pub project: String,
}

/// A project and a repository.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
}

/// A pull request within a repository.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Pull request ID.
    pub pull_request_id: f64,
}

/// A comment thread on a pull request.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Pull request ID.
    pub pull_request_id: f64,
    /// Thread ID.
    pub thread_id: f64,
}

/// A work item ID.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemIdParams {
    /// Work item ID.
    pub id: f64,
}

/// Free-text search, optionally scoped to a project.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Search text.
    pub search_text: String,
    /// Optional project name to scope the search.
    pub project: Option<String>,
}

// ============================================================================
// Projects
// ============================================================================

/// Parameters for `get_project`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProjectParams {
    /// Project name or ID.
    pub project_id: String,
}

// ============================================================================
// Work items
// ============================================================================

/// Parameters for `list_work_items`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkItemsParams {
    /// Project name.
    pub project: String,
    /// Optional WIQL query.
    pub query: Option<String>,
}

/// Parameters for `wit_update_work_item`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkItemParams {
    /// Work item ID.
    pub id: f64,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New state.
    pub state: Option<String>,
    /// New assignee.
    pub assigned_to: Option<String>,
}

/// Parameters for `wit_create_work_item`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkItemParams {
    /// Project name.
    pub project: String,
    /// Work item type (e.g. Task, Bug, User Story).
    #[serde(rename = "type")]
    pub work_item_type: String,
    /// Work item fields as key-value pairs. Short names (title,
    /// description, assignedTo, state, tags, areaPath, iterationPath,
    /// priority) or full reference names such as `System.Title`.
    pub fields: Map<String, Value>,
}

/// Parameters for `wit_get_work_items_for_iteration`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IterationWorkItemsParams {
    /// Project name.
    pub project: String,
    /// Iteration path.
    pub iteration_path: String,
}

/// Parameters for `wit_add_work_item_comment`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentParams {
    /// Work item ID.
    pub id: f64,
    /// Comment text.
    pub comment: String,
}

/// Parameters for `wit_work_items_link`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkWorkItemsParams {
    /// Source work item ID.
    pub source_id: f64,
    /// Target work item ID.
    pub target_id: f64,
    /// Link type (Related, Parent, Child, Predecessor, Successor).
    pub link_type: String,
}

/// Parameters for `wit_run_query`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryParams {
    /// WIQL query string.
    pub query: String,
}

// ============================================================================
// Repositories
// ============================================================================

/// Parameters for `list_pull_requests`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPullRequestsParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// PR status (active, completed, abandoned).
    pub status: Option<String>,
}

/// Parameters for `create_pull_request`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequestParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Source branch name.
    pub source_branch: String,
    /// Target branch name.
    pub target_branch: String,
    /// PR title.
    pub title: String,
    /// PR description.
    pub description: Option<String>,
}

/// Parameters for `update_pull_request_status`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePullRequestStatusParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Pull request ID.
    pub pull_request_id: f64,
    /// New status (active, abandoned, completed).
    pub status: String,
}

/// Parameters for `repo_get_repo_by_name_or_id`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetRepositoryParams {
    /// Project name.
    pub project: String,
    /// Repository name or ID.
    pub repo_id_or_name: String,
}

/// Parameters for `repo_get_branch_by_name`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetBranchParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Branch name, with or without `refs/heads/`.
    pub branch_name: String,
}

/// Parameters for `repo_reply_to_comment`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplyToCommentParams {
    /// Project name.
    pub project: String,
    /// Repository name.
    pub repository: String,
    /// Pull request ID.
    pub pull_request_id: f64,
    /// Thread ID.
    pub thread_id: f64,
    /// Reply text.
    pub content: String,
}

// ============================================================================
// Builds
// ============================================================================

/// Parameters for `run_build`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunBuildParams {
    /// Project name.
    pub project: String,
    /// Build definition ID.
    pub definition_id: f64,
    /// Branch to build from.
    pub source_branch: Option<String>,
}

/// Parameters for `get_build_status` and `get_test_results_by_build`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildParams {
    /// Project name.
    pub project: String,
    /// Build ID.
    pub build_id: f64,
}

// ============================================================================
// Test plans
// ============================================================================

/// Parameters for `create_test_plan`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestPlanParams {
    /// Project name.
    pub project: String,
    /// Test plan name.
    pub name: String,
    /// Area path for the test plan.
    pub area_path: Option<String>,
    /// Iteration path.
    pub iteration: Option<String>,
}

/// Parameters for `list_test_plans`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTestPlansParams {
    /// Project name.
    pub project: String,
    /// Filter for active test plans only.
    pub is_active: Option<bool>,
}

/// Parameters for `create_test_suite`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestSuiteParams {
    /// Project name.
    pub project: String,
    /// Test plan ID.
    pub plan_id: f64,
    /// Test suite name.
    pub name: String,
    /// Suite type (StaticTestSuite, DynamicTestSuite, RequirementTestSuite).
    pub suite_type: Option<String>,
}

/// Parameters for `create_test_case`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestCaseParams {
    /// Project name.
    pub project: String,
    /// Test case title.
    pub title: String,
    /// Test steps, one per line.
    pub steps: Option<String>,
    /// Expected results.
    pub expected_result: Option<String>,
    /// Priority (1-4).
    #[schemars(range(min = 1, max = 4))]
    pub priority: Option<f64>,
}

/// Parameters for `add_test_cases_to_suite`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTestCasesParams {
    /// Project name.
    pub project: String,
    /// Test plan ID.
    pub plan_id: f64,
    /// Test suite ID.
    pub suite_id: f64,
    /// Test case IDs to add.
    pub test_case_ids: Vec<f64>,
}

/// Parameters for `list_test_cases`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuiteParams {
    /// Project name.
    pub project: String,
    /// Test plan ID.
    pub plan_id: f64,
    /// Test suite ID.
    pub suite_id: f64,
}

/// Parameters for `run_test_case`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunTestCaseParams {
    /// Project name.
    pub project: String,
    /// Test plan ID.
    pub plan_id: f64,
    /// Test suite ID.
    pub suite_id: f64,
    /// Test case ID.
    pub test_case_id: f64,
    /// Test outcome (Passed, Failed, Blocked, NotApplicable).
    pub outcome: String,
    /// Optional comment about the test run.
    pub comment: Option<String>,
}

/// Parameters for `get_test_results`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestRunParams {
    /// Project name.
    pub project: String,
    /// Test run ID.
    pub run_id: f64,
}

// ============================================================================
// Releases
// ============================================================================

/// Parameters for `list_releases`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListReleasesParams {
    /// Project name.
    pub project: String,
    /// Optional release definition ID to filter.
    pub definition_id: Option<f64>,
}

/// Parameters for `create_release`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReleaseParams {
    /// Project name.
    pub project: String,
    /// Release definition ID.
    pub definition_id: f64,
    /// Release description.
    pub description: Option<String>,
}

/// Parameters for `deploy_release`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployReleaseParams {
    /// Project name.
    pub project: String,
    /// Release ID.
    pub release_id: f64,
    /// Environment ID.
    pub environment_id: f64,
}

// ============================================================================
// Wikis
// ============================================================================

/// Parameters for `get_wiki_page`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WikiPageParams {
    /// Project name.
    pub project: String,
    /// Wiki name or ID.
    pub wiki_identifier: String,
    /// Page path (e.g. /Overview/Getting-Started).
    pub path: String,
}

/// Parameters for `create_wiki_page`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWikiPageParams {
    /// Project name.
    pub project: String,
    /// Wiki name or ID.
    pub wiki_identifier: String,
    /// Page path.
    pub path: String,
    /// Page content in Markdown.
    pub content: String,
}

/// Parameters for `update_wiki_page`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWikiPageParams {
    /// Project name.
    pub project: String,
    /// Wiki name or ID.
    pub wiki_identifier: String,
    /// Page path.
    pub path: String,
    /// New page content in Markdown.
    pub content: String,
    /// Current version (`ETag`) from `get_wiki_page`.
    pub version: String,
}

// ============================================================================
// Iterations and areas
// ============================================================================

/// Parameters for `create_iteration`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIterationParams {
    /// Project name.
    pub project: String,
    /// Iteration name.
    pub name: String,
    /// Start date (YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Finish date (YYYY-MM-DD).
    pub finish_date: Option<String>,
    /// Parent path.
    pub path: Option<String>,
}

/// Parameters for `create_area`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAreaParams {
    /// Project name.
    pub project: String,
    /// Area name.
    pub name: String,
    /// Parent path.
    pub path: Option<String>,
}
