//! Tool definitions with rmcp macros.
//!
//! Each `#[tool]` method validates nothing itself: it hands its
//! parameters to the matching [`DevOpsClient`] operation, which validates
//! before any I/O, then renders the result with [`super::format`].
//! Failures become `isError` results whose text names the tool.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};

use super::format;
use super::params::{
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
use super::types::AppState;
use crate::devops::{
    DevOpsClient, IterationDates, NewPullRequest, NewTestCase, TestCaseRef, WorkItemUpdate,
};
use crate::error::AppError;

type ToolResult = Result<CallToolResult, McpError>;

/// Turns an operation outcome into a tool result.
///
/// Errors are reported in-band as `Error in {tool}: Failed to {action}: {reason}`,
/// never as protocol errors.
fn respond(tool: &str, action: &str, result: Result<String, AppError>) -> ToolResult {
    match result {
        Ok(text) => {
            tracing::debug!(tool, "tool completed");
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(e) => {
            tracing::warn!(tool, error = %e, retryable = e.is_retryable(), "tool failed");
            Ok(CallToolResult::error(vec![Content::text(format!(
                "Error in {tool}: Failed to {action}: {e}"
            ))]))
        }
    }
}

/// MCP server exposing Azure DevOps operations as tools.
#[derive(Clone)]
pub struct DevOpsServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DevOpsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsServer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DevOpsServer {
    /// Creates a server over the given state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// Returns the shared state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    fn client(&self) -> &DevOpsClient {
        &self.state.client
    }
}

#[tool_router]
impl DevOpsServer {
    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    #[tool(description = "List all projects in the Azure DevOps organization")]
    async fn list_projects(&self) -> ToolResult {
        let result = self.client().list_projects().await;
        respond(
            "list_projects",
            "list projects",
            result.map(|p| format::projects(&p)),
        )
    }

    #[tool(description = "Get detailed information about a specific project")]
    async fn get_project(&self, Parameters(p): Parameters<GetProjectParams>) -> ToolResult {
        let result = self.client().get_project(&p.project_id).await;
        respond(
            "get_project",
            "get project",
            result.map(|p| format::project(&p)),
        )
    }

    // ------------------------------------------------------------------------
    // Work items
    // ------------------------------------------------------------------------

    #[tool(description = "List work items in a project with optional WIQL query")]
    async fn list_work_items(&self, Parameters(p): Parameters<ListWorkItemsParams>) -> ToolResult {
        let result = self
            .client()
            .list_work_items(&p.project, p.query.as_deref())
            .await;
        respond(
            "list_work_items",
            "list work items",
            result.map(|items| format::work_items(&items)),
        )
    }

    #[tool(description = "Retrieve work items assigned to me")]
    async fn wit_my_work_items(&self, Parameters(p): Parameters<ProjectParams>) -> ToolResult {
        let result = self.client().my_work_items(&p.project).await;
        respond(
            "wit_my_work_items",
            "get my work items",
            result.map(|items| format::work_items(&items)),
        )
    }

    #[tool(description = "Get a single work item by ID")]
    async fn wit_get_work_item(&self, Parameters(p): Parameters<WorkItemIdParams>) -> ToolResult {
        let result = self.client().get_work_item(p.id).await;
        respond(
            "wit_get_work_item",
            "get work item",
            result.map(|wi| format::work_item_details(&wi)),
        )
    }

    #[tool(description = "Update a work item with new field values")]
    async fn wit_update_work_item(
        &self,
        Parameters(p): Parameters<UpdateWorkItemParams>,
    ) -> ToolResult {
        let update = WorkItemUpdate {
            title: p.title,
            description: p.description,
            state: p.state,
            assigned_to: p.assigned_to,
        };
        let result = self.client().update_work_item(p.id, &update).await;
        respond(
            "wit_update_work_item",
            "update work item",
            result.map(|wi| format::work_item_updated(wi.as_ref())),
        )
    }

    #[tool(description = "Create a new work item")]
    async fn wit_create_work_item(
        &self,
        Parameters(p): Parameters<CreateWorkItemParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .create_work_item(&p.project, &p.work_item_type, &p.fields)
            .await;
        respond(
            "wit_create_work_item",
            "create work item",
            result.map(|wi| format::work_item_created(&wi)),
        )
    }

    #[tool(description = "List comments for a work item")]
    async fn wit_list_work_item_comments(
        &self,
        Parameters(p): Parameters<WorkItemIdParams>,
    ) -> ToolResult {
        let result = self.client().list_work_item_comments(p.id).await;
        respond(
            "wit_list_work_item_comments",
            "list work item comments",
            result.map(|list| format::work_item_comments(p.id, &list.comments)),
        )
    }

    #[tool(description = "Get work items for a specific iteration")]
    async fn wit_get_work_items_for_iteration(
        &self,
        Parameters(p): Parameters<IterationWorkItemsParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .work_items_for_iteration(&p.project, &p.iteration_path)
            .await;
        respond(
            "wit_get_work_items_for_iteration",
            "get work items for iteration",
            result.map(|items| format::work_items(&items)),
        )
    }

    #[tool(description = "Add a comment to a work item")]
    async fn wit_add_work_item_comment(
        &self,
        Parameters(p): Parameters<AddCommentParams>,
    ) -> ToolResult {
        let result = self.client().add_work_item_comment(p.id, &p.comment).await;
        respond(
            "wit_add_work_item_comment",
            "add comment",
            result.map(|_| format!("Comment added to work item #{}", p.id)),
        )
    }

    #[tool(description = "Link two work items together (Related, Parent, Child, Predecessor, Successor)")]
    async fn wit_work_items_link(
        &self,
        Parameters(p): Parameters<LinkWorkItemsParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .link_work_items(p.source_id, p.target_id, &p.link_type)
            .await;
        respond(
            "wit_work_items_link",
            "link work items",
            result.map(|link| {
                format!(
                    "Linked work item #{} to #{} with {link} relationship",
                    p.source_id, p.target_id
                )
            }),
        )
    }

    #[tool(description = "Run a custom WIQL query")]
    async fn wit_run_query(&self, Parameters(p): Parameters<RunQueryParams>) -> ToolResult {
        let result = self.client().run_query(&p.query).await;
        respond(
            "wit_run_query",
            "run query",
            result.map(|items| format::query_results(&items)),
        )
    }

    #[tool(description = "Search work items using text search")]
    async fn wit_search_work_items(&self, Parameters(p): Parameters<SearchParams>) -> ToolResult {
        let result = self
            .client()
            .search_work_items(&p.search_text, p.project.as_deref())
            .await;
        respond(
            "wit_search_work_items",
            "search work items",
            result.map(|hits| format::work_item_search(&hits)),
        )
    }

    // ------------------------------------------------------------------------
    // Repositories and pull requests
    // ------------------------------------------------------------------------

    #[tool(description = "List pull requests in a repository")]
    async fn list_pull_requests(
        &self,
        Parameters(p): Parameters<ListPullRequestsParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .list_pull_requests(&p.project, &p.repository, p.status.as_deref())
            .await;
        respond(
            "list_pull_requests",
            "list pull requests",
            result.map(|prs| format::pull_requests(&prs)),
        )
    }

    #[tool(description = "Create a new pull request")]
    async fn create_pull_request(
        &self,
        Parameters(p): Parameters<CreatePullRequestParams>,
    ) -> ToolResult {
        let pr = NewPullRequest {
            source_branch: &p.source_branch,
            target_branch: &p.target_branch,
            title: &p.title,
            description: p.description.as_deref(),
        };
        let result = self
            .client()
            .create_pull_request(&p.project, &p.repository, pr)
            .await;
        respond(
            "create_pull_request",
            "create pull request",
            result.map(|pr| format::pull_request_created(&pr, &p.source_branch, &p.target_branch)),
        )
    }

    #[tool(description = "Update pull request status (active, abandoned, completed)")]
    async fn update_pull_request_status(
        &self,
        Parameters(p): Parameters<UpdatePullRequestStatusParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .update_pull_request_status(&p.project, &p.repository, p.pull_request_id, &p.status)
            .await;
        respond(
            "update_pull_request_status",
            "update pull request status",
            result.map(|pr| format::pull_request_status(&pr)),
        )
    }

    #[tool(description = "List branches in a repository")]
    async fn list_branches(&self, Parameters(p): Parameters<RepositoryParams>) -> ToolResult {
        let result = self.client().list_branches(&p.project, &p.repository).await;
        respond(
            "list_branches",
            "list branches",
            result.map(|refs| format::branches(&refs)),
        )
    }

    #[tool(description = "Get a pull request by its ID")]
    async fn repo_get_pull_request_by_id(
        &self,
        Parameters(p): Parameters<PullRequestParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .get_pull_request(&p.project, &p.repository, p.pull_request_id)
            .await;
        respond(
            "repo_get_pull_request_by_id",
            "get pull request",
            result.map(|pr| format::pull_request_details(&pr)),
        )
    }

    #[tool(description = "List repositories in a project")]
    async fn repo_list_repos_by_project(
        &self,
        Parameters(p): Parameters<ProjectParams>,
    ) -> ToolResult {
        let result = self.client().list_repositories(&p.project).await;
        respond(
            "repo_list_repos_by_project",
            "list repositories",
            result.map(|repos| format::repositories(&p.project, &repos)),
        )
    }

    #[tool(description = "Get a repository by name or ID")]
    async fn repo_get_repo_by_name_or_id(
        &self,
        Parameters(p): Parameters<GetRepositoryParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .get_repository(&p.project, &p.repo_id_or_name)
            .await;
        respond(
            "repo_get_repo_by_name_or_id",
            "get repository",
            result.map(|repo| format::repository(&repo)),
        )
    }

    #[tool(description = "Get a branch by name")]
    async fn repo_get_branch_by_name(
        &self,
        Parameters(p): Parameters<GetBranchParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .get_branch(&p.project, &p.repository, &p.branch_name)
            .await;
        respond(
            "repo_get_branch_by_name",
            "get branch",
            result.map(|branch| format::branch(&p.branch_name, branch.as_ref())),
        )
    }

    #[tool(description = "List pull requests across all repositories in a project")]
    async fn repo_list_pull_requests_by_project(
        &self,
        Parameters(p): Parameters<ProjectParams>,
    ) -> ToolResult {
        let result = self.client().list_pull_requests_by_project(&p.project).await;
        respond(
            "repo_list_pull_requests_by_project",
            "list pull requests by project",
            result.map(|prs| format::project_pull_requests(&p.project, &prs)),
        )
    }

    #[tool(description = "List comment threads on a pull request")]
    async fn repo_list_pull_request_threads(
        &self,
        Parameters(p): Parameters<PullRequestParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .list_pull_request_threads(&p.project, &p.repository, p.pull_request_id)
            .await;
        respond(
            "repo_list_pull_request_threads",
            "list pull request threads",
            result.map(|threads| format::threads(p.pull_request_id, &threads)),
        )
    }

    #[tool(description = "List comments in a pull request thread")]
    async fn repo_list_pull_request_thread_comments(
        &self,
        Parameters(p): Parameters<ThreadParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .list_pull_request_thread_comments(
                &p.project,
                &p.repository,
                p.pull_request_id,
                p.thread_id,
            )
            .await;
        respond(
            "repo_list_pull_request_thread_comments",
            "list pull request thread comments",
            result.map(|comments| format::thread_comments(p.thread_id, &comments)),
        )
    }

    #[tool(description = "Reply to a pull request comment thread")]
    async fn repo_reply_to_comment(
        &self,
        Parameters(p): Parameters<ReplyToCommentParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .reply_to_comment(
                &p.project,
                &p.repository,
                p.pull_request_id,
                p.thread_id,
                &p.content,
            )
            .await;
        respond(
            "repo_reply_to_comment",
            "reply to comment",
            result.map(|_| format!("Successfully replied to thread #{}.", p.thread_id)),
        )
    }

    #[tool(description = "Resolve a pull request comment thread")]
    async fn repo_resolve_comment(&self, Parameters(p): Parameters<ThreadParams>) -> ToolResult {
        let result = self
            .client()
            .resolve_thread(&p.project, &p.repository, p.pull_request_id, p.thread_id)
            .await;
        respond(
            "repo_resolve_comment",
            "resolve comment",
            result.map(|_| format!("Successfully resolved thread #{}.", p.thread_id)),
        )
    }

    // ------------------------------------------------------------------------
    // Builds
    // ------------------------------------------------------------------------

    #[tool(description = "Trigger a new build")]
    async fn run_build(&self, Parameters(p): Parameters<RunBuildParams>) -> ToolResult {
        let result = self
            .client()
            .run_build(&p.project, p.definition_id, p.source_branch.as_deref())
            .await;
        respond(
            "run_build",
            "run build",
            result.map(|build| format::build_started(&build)),
        )
    }

    #[tool(description = "Get the status of a specific build")]
    async fn get_build_status(&self, Parameters(p): Parameters<BuildParams>) -> ToolResult {
        let result = self.client().get_build(&p.project, p.build_id).await;
        respond(
            "get_build_status",
            "get build status",
            result.map(|build| format::build_status(&build)),
        )
    }

    #[tool(description = "List build definitions in a project")]
    async fn list_build_definitions(&self, Parameters(p): Parameters<ProjectParams>) -> ToolResult {
        let result = self.client().list_build_definitions(&p.project).await;
        respond(
            "list_build_definitions",
            "list build definitions",
            result.map(|defs| format::build_definitions(&defs)),
        )
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    #[tool(description = "Search for code across repositories")]
    async fn search_code(&self, Parameters(p): Parameters<SearchParams>) -> ToolResult {
        let result = self
            .client()
            .search_code(&p.search_text, p.project.as_deref())
            .await;
        respond(
            "search_code",
            "search code",
            result.map(|hits| format::code_search(&hits)),
        )
    }

    // ------------------------------------------------------------------------
    // Test plans
    // ------------------------------------------------------------------------

    #[tool(description = "Create a new test plan in the project")]
    async fn create_test_plan(&self, Parameters(p): Parameters<CreateTestPlanParams>) -> ToolResult {
        let result = self
            .client()
            .create_test_plan(
                &p.project,
                &p.name,
                p.area_path.as_deref(),
                p.iteration.as_deref(),
            )
            .await;
        respond(
            "create_test_plan",
            "create test plan",
            result.map(|plan| format!("Created test plan: {} (ID: {})", plan.name, plan.id)),
        )
    }

    #[tool(description = "List all test plans in a project")]
    async fn list_test_plans(&self, Parameters(p): Parameters<ListTestPlansParams>) -> ToolResult {
        let result = self.client().list_test_plans(&p.project, p.is_active).await;
        respond(
            "list_test_plans",
            "list test plans",
            result.map(|plans| format::test_plans(&plans)),
        )
    }

    #[tool(description = "Create a test suite within a test plan")]
    async fn create_test_suite(
        &self,
        Parameters(p): Parameters<CreateTestSuiteParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .create_test_suite(&p.project, p.plan_id, &p.name, p.suite_type.as_deref())
            .await;
        respond(
            "create_test_suite",
            "create test suite",
            result.map(|suite| {
                format!(
                    "Created test suite: {} (ID: {}) in plan {}",
                    suite.name, suite.id, p.plan_id
                )
            }),
        )
    }

    #[tool(description = "Create a new test case")]
    async fn create_test_case(&self, Parameters(p): Parameters<CreateTestCaseParams>) -> ToolResult {
        let test_case = NewTestCase {
            title: &p.title,
            steps: p.steps.as_deref(),
            expected_result: p.expected_result.as_deref(),
            priority: p.priority,
        };
        let result = self.client().create_test_case(&p.project, test_case).await;
        respond(
            "create_test_case",
            "create test case",
            result.map(|wi| format!("Created test case #{}: {}", wi.id, wi.title())),
        )
    }

    #[tool(description = "Add test cases to a test suite")]
    async fn add_test_cases_to_suite(
        &self,
        Parameters(p): Parameters<AddTestCasesParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .add_test_cases_to_suite(&p.project, p.plan_id, p.suite_id, &p.test_case_ids)
            .await;
        respond(
            "add_test_cases_to_suite",
            "add test cases to suite",
            result.map(|_| {
                format!(
                    "Added {} test cases to suite {}",
                    p.test_case_ids.len(),
                    p.suite_id
                )
            }),
        )
    }

    #[tool(description = "List test cases in a test suite")]
    async fn list_test_cases(&self, Parameters(p): Parameters<SuiteParams>) -> ToolResult {
        let result = self
            .client()
            .list_test_cases(&p.project, p.plan_id, p.suite_id)
            .await;
        respond(
            "list_test_cases",
            "list test cases",
            result.map(|cases| format::test_cases(&cases)),
        )
    }

    #[tool(description = "Execute a test case and record its outcome (Passed, Failed, Blocked, NotApplicable)")]
    async fn run_test_case(&self, Parameters(p): Parameters<RunTestCaseParams>) -> ToolResult {
        let ids = TestCaseRef {
            plan_id: p.plan_id,
            suite_id: p.suite_id,
            test_case_id: p.test_case_id,
        };
        let result = self
            .client()
            .run_test_case(&p.project, ids, &p.outcome, p.comment.as_deref())
            .await;
        respond(
            "run_test_case",
            "run test case",
            result.map(|(_, outcome)| {
                format!(
                    "Test case {} executed with outcome: {outcome}",
                    p.test_case_id
                )
            }),
        )
    }

    #[tool(description = "Get test results for a test run")]
    async fn get_test_results(&self, Parameters(p): Parameters<TestRunParams>) -> ToolResult {
        let result = self.client().get_test_results(&p.project, p.run_id).await;
        respond(
            "get_test_results",
            "get test results",
            result.map(|results| format::test_run_results(p.run_id, &results)),
        )
    }

    #[tool(description = "Get a test result summary for a specific build")]
    async fn get_test_results_by_build(
        &self,
        Parameters(p): Parameters<BuildParams>,
    ) -> ToolResult {
        let result = self
            .client()
            .get_test_results_by_build(&p.project, p.build_id)
            .await;
        respond(
            "get_test_results_by_build",
            "get test results by build",
            result.map(|results| format::build_test_results(p.build_id, &results)),
        )
    }

    // ------------------------------------------------------------------------
    // Releases
    // ------------------------------------------------------------------------

    #[tool(description = "List all release definitions in a project")]
    async fn list_release_definitions(
        &self,
        Parameters(p): Parameters<ProjectParams>,
    ) -> ToolResult {
        let result = self.client().list_release_definitions(&p.project).await;
        respond(
            "list_release_definitions",
            "list release definitions",
            result.map(|defs| format::release_definitions(&defs)),
        )
    }

    #[tool(description = "List releases for a project")]
    async fn list_releases(&self, Parameters(p): Parameters<ListReleasesParams>) -> ToolResult {
        let result = self
            .client()
            .list_releases(&p.project, p.definition_id)
            .await;
        respond(
            "list_releases",
            "list releases",
            result.map(|releases| format::releases(&releases)),
        )
    }

    #[tool(description = "Create a new release")]
    async fn create_release(&self, Parameters(p): Parameters<CreateReleaseParams>) -> ToolResult {
        let result = self
            .client()
            .create_release(&p.project, p.definition_id, p.description.as_deref())
            .await;
        respond(
            "create_release",
            "create release",
            result.map(|release| format::release_created(&release)),
        )
    }

    #[tool(description = "Deploy a release to an environment")]
    async fn deploy_release(&self, Parameters(p): Parameters<DeployReleaseParams>) -> ToolResult {
        let result = self
            .client()
            .deploy_release(&p.project, p.release_id, p.environment_id)
            .await;
        respond(
            "deploy_release",
            "deploy release",
            result.map(|_| {
                format!(
                    "Started deployment of release {} to environment {}",
                    p.release_id, p.environment_id
                )
            }),
        )
    }

    // ------------------------------------------------------------------------
    // Wikis
    // ------------------------------------------------------------------------

    #[tool(description = "List all wikis in a project")]
    async fn list_wikis(&self, Parameters(p): Parameters<ProjectParams>) -> ToolResult {
        let result = self.client().list_wikis(&p.project).await;
        respond(
            "list_wikis",
            "list wikis",
            result.map(|wikis| format::wikis(&wikis)),
        )
    }

    #[tool(description = "Get a wiki page's content and version")]
    async fn get_wiki_page(&self, Parameters(p): Parameters<WikiPageParams>) -> ToolResult {
        let result = self
            .client()
            .get_wiki_page(&p.project, &p.wiki_identifier, &p.path)
            .await;
        respond(
            "get_wiki_page",
            "get wiki page",
            result.map(|page| format::wiki_page(&page)),
        )
    }

    #[tool(description = "Create a new wiki page")]
    async fn create_wiki_page(&self, Parameters(p): Parameters<CreateWikiPageParams>) -> ToolResult {
        let result = self
            .client()
            .create_wiki_page(&p.project, &p.wiki_identifier, &p.path, &p.content)
            .await;
        respond(
            "create_wiki_page",
            "create wiki page",
            result.map(|page| format!("Created wiki page: {}", page.path)),
        )
    }

    #[tool(description = "Update an existing wiki page; version is the ETag from get_wiki_page")]
    async fn update_wiki_page(&self, Parameters(p): Parameters<UpdateWikiPageParams>) -> ToolResult {
        let result = self
            .client()
            .update_wiki_page(
                &p.project,
                &p.wiki_identifier,
                &p.path,
                &p.content,
                &p.version,
            )
            .await;
        respond(
            "update_wiki_page",
            "update wiki page",
            result.map(|page| format!("Updated wiki page: {}", page.path)),
        )
    }

    // ------------------------------------------------------------------------
    // Iterations and areas
    // ------------------------------------------------------------------------

    #[tool(description = "List all iterations in a project")]
    async fn list_iterations(&self, Parameters(p): Parameters<ProjectParams>) -> ToolResult {
        let result = self.client().list_iterations(&p.project).await;
        respond(
            "list_iterations",
            "list iterations",
            result.map(|iterations| format::iterations(&iterations)),
        )
    }

    #[tool(description = "List all areas in a project")]
    async fn list_areas(&self, Parameters(p): Parameters<ProjectParams>) -> ToolResult {
        let result = self.client().list_areas(&p.project).await;
        respond(
            "list_areas",
            "list areas",
            result.map(|root| format::areas(&root)),
        )
    }

    #[tool(description = "Create a new iteration, optionally with start and finish dates (YYYY-MM-DD)")]
    async fn create_iteration(
        &self,
        Parameters(p): Parameters<CreateIterationParams>,
    ) -> ToolResult {
        let result = match IterationDates::parse(p.start_date.as_deref(), p.finish_date.as_deref()) {
            Ok(dates) => {
                self.client()
                    .create_iteration(&p.project, &p.name, dates, p.path.as_deref())
                    .await
            }
            Err(e) => Err(e.into()),
        };
        respond(
            "create_iteration",
            "create iteration",
            result.map(|node| format::iteration_created(&node)),
        )
    }

    #[tool(description = "Create a new area")]
    async fn create_area(&self, Parameters(p): Parameters<CreateAreaParams>) -> ToolResult {
        let result = self
            .client()
            .create_area(&p.project, &p.name, p.path.as_deref())
            .await;
        respond(
            "create_area",
            "create area",
            result.map(|node| format::area_created(&node)),
        )
    }
}

#[tool_handler]
impl ServerHandler for DevOpsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Azure DevOps tools for organization '{}': work items, repositories, \
                 pull requests, builds, test plans, releases, wikis, iterations and areas. \
                 Outbound calls are limited to {} per {} seconds.",
                self.state.config.organization,
                self.client().rate_limiter().max_requests(),
                self.client().rate_limiter().window_ms() / 1000,
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{Config, SecretString};
    use crate::devops::ClientConfig;
    use rmcp::model::RawContent;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> Config {
        Config {
            organization: "contoso".to_string(),
            pat: SecretString::new("test-pat"),
            log_level: "info".to_string(),
            request_timeout_ms: 5_000,
        }
    }

    fn server_for(base_url: &str) -> DevOpsServer {
        let client = DevOpsClient::new("test-pat", ClientConfig::with_single_host(base_url)).unwrap();
        DevOpsServer::new(AppState::new(client, config()))
    }

    fn text(result: &CallToolResult) -> &str {
        result
            .content
            .first()
            .and_then(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .expect("text content")
    }

    #[test]
    fn test_server_info() {
        let server = server_for("http://localhost:1");
        let info = ServerHandler::get_info(&server);
        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("contoso"));
        assert!(instructions.contains("100 per 60 seconds"));
    }

    #[test]
    fn test_every_tool_registered() {
        let server = server_for("http://localhost:1");
        assert_eq!(server.tool_count(), 51);
    }

    #[test]
    fn test_respond_success() {
        let result = respond("list_wikis", "list wikis", Ok("Found 0 wikis:".into())).unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(text(&result), "Found 0 wikis:");
    }

    #[test]
    fn test_respond_error_names_tool() {
        let err = AppError::Validation(crate::error::ValidationError::InvalidId {
            field: "work item ID".into(),
        });
        let result = respond("wit_get_work_item", "get work item", Err(err)).unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(
            text(&result),
            "Error in wit_get_work_item: Failed to get work item: Invalid work item ID"
        );
    }

    #[tokio::test]
    async fn test_list_projects_renders_text() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_apis/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "value": [{ "id": "p1", "name": "Fabrikam", "description": "Main" }]
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let server = server_for(&mock.uri());
        let result = server.list_projects().await.unwrap();
        assert_eq!(text(&result), "Found 1 projects:\n- Fabrikam: Main");
    }

    #[tokio::test]
    async fn test_invalid_id_is_tool_error_without_request() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock)
            .await;

        let server = server_for(&mock.uri());
        let result = server
            .wit_get_work_item(Parameters(WorkItemIdParams { id: 3.5 }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text(&result).contains("Invalid work item ID"));
    }

    #[tokio::test]
    async fn test_update_without_fields() {
        let server = server_for("http://localhost:1");
        let result = server
            .wit_update_work_item(Parameters(UpdateWorkItemParams {
                id: 5.0,
                title: None,
                description: Some(String::new()),
                state: None,
                assigned_to: None,
            }))
            .await
            .unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(text(&result), "No updates provided");
    }

    #[tokio::test]
    async fn test_one_sided_iteration_dates_rejected() {
        let server = server_for("http://localhost:1");
        let result = server
            .create_iteration(Parameters(CreateIterationParams {
                project: "Fabrikam".into(),
                name: "Sprint 9".into(),
                start_date: Some("2024-06-01".into()),
                finish_date: None,
                path: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text(&result).starts_with("Error in create_iteration: Failed to create iteration:"));
    }

    #[tokio::test]
    async fn test_api_failure_is_reported_in_band() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Fabrikam/_apis/wiki/wikis"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "Project not found" })),
            )
            .mount(&mock)
            .await;

        let server = server_for(&mock.uri());
        let result = server
            .list_wikis(Parameters(ProjectParams {
                project: "Fabrikam".into(),
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(
            text(&result),
            "Error in list_wikis: Failed to list wikis: 404: Project not found"
        );
    }
}
