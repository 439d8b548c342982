//! Plain-text rendering of API responses.
//!
//! Tools answer with human-readable text rather than raw JSON. Every
//! renderer here is a pure function so the output can be tested without
//! a server.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::devops::types::{
    Build, BuildDefinitionReference, ClassificationNode, CodeSearchResult, CommentThread,
    GitPullRequest, GitRef, GitRepository, PullRequestComment, Release, ReleaseDefinition,
    SuiteTestCase, TeamIteration, TeamProject, TestCaseResult, TestOutcomeSummary, TestPlan,
    VersionedWikiPage, Wiki, WorkItem, WorkItemComment, WorkItemSearchResult,
};

/// Number of individual results listed under a build's test summary.
pub const BUILD_RESULT_DETAILS: usize = 10;

const ROOT_PATH: &str = "\\";

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|s| !s.is_empty()).unwrap_or(fallback)
}

/// `Found N {noun}:` followed by one line per item.
fn listing<T>(header: &str, items: &[T], line: impl Fn(&T) -> String) -> String {
    let mut out = header.to_string();
    for item in items {
        out.push('\n');
        out.push_str(&line(item));
    }
    out
}

fn folder_suffix(path: Option<&str>) -> String {
    match path {
        Some(path) if path != ROOT_PATH => format!(" in {path}"),
        _ => String::new(),
    }
}

// ============================================================================
// Projects
// ============================================================================

pub fn projects(projects: &[TeamProject]) -> String {
    listing(
        &format!("Found {} projects:", projects.len()),
        projects,
        |p| format!("- {}: {}", p.name, or(p.description.as_deref(), "No description")),
    )
}

pub fn project(p: &TeamProject) -> String {
    format!(
        "Project: {}\nID: {}\nDescription: {}\nState: {}\nURL: {}\nVisibility: {}",
        p.name,
        p.id,
        or(p.description.as_deref(), "No description"),
        or(p.state.as_deref(), "Unknown"),
        or(p.url.as_deref(), ""),
        or(p.visibility.as_deref(), "Unknown"),
    )
}

// ============================================================================
// Work items
// ============================================================================

fn work_item_line(wi: &WorkItem) -> String {
    format!(
        "- [{}] {} ({}, {}, {})",
        wi.id,
        wi.title(),
        wi.work_item_type(),
        wi.state(),
        wi.assigned_to().unwrap_or("Unassigned"),
    )
}

pub fn work_items(items: &[WorkItem]) -> String {
    listing(&format!("Found {} work items:", items.len()), items, work_item_line)
}

pub fn query_results(items: &[WorkItem]) -> String {
    if items.is_empty() {
        return "Query returned no results".to_string();
    }
    listing(
        &format!("Query returned {} items:", items.len()),
        items,
        work_item_line,
    )
}

pub fn work_item_details(wi: &WorkItem) -> String {
    format!(
        "Work Item #{}:\nTitle: {}\nType: {}\nState: {}\nAssigned To: {}\nCreated By: {}\n\
         Created: {}\nLast Updated: {}\nTags: {}\n\nDescription:\n{}",
        wi.id,
        wi.title(),
        wi.work_item_type(),
        wi.state(),
        wi.assigned_to().unwrap_or("Unassigned"),
        wi.identity_name("System.CreatedBy").unwrap_or("Unknown"),
        timestamp(wi.date_field("System.CreatedDate")).unwrap_or_default(),
        timestamp(wi.date_field("System.ChangedDate")).unwrap_or_default(),
        or(wi.field_str("System.Tags"), "No tags"),
        or(wi.field_str("System.Description"), "No description"),
    )
}

pub fn work_item_created(wi: &WorkItem) -> String {
    format!("Created work item #{}: {}", wi.id, wi.title())
}

pub fn work_item_updated(wi: Option<&WorkItem>) -> String {
    wi.map_or_else(
        || "No updates provided".to_string(),
        |wi| format!("Updated work item #{}: {}", wi.id, wi.title()),
    )
}

pub fn work_item_comments(id: f64, comments: &[WorkItemComment]) -> String {
    if comments.is_empty() {
        return format!("No comments on work item #{id}");
    }
    listing(
        &format!("Found {} comments on work item #{id}:", comments.len()),
        comments,
        |c| {
            let author = c
                .created_by
                .as_ref()
                .map_or("Unknown", |a| a.display_name.as_str());
            match timestamp(c.created_date) {
                Some(when) => format!("- [{}] {author} ({when}): {}", c.id, c.text),
                None => format!("- [{}] {author}: {}", c.id, c.text),
            }
        },
    )
}

pub fn work_item_search(results: &[WorkItemSearchResult]) -> String {
    if results.is_empty() {
        return "No work items found matching the search criteria".to_string();
    }
    listing(
        &format!("Found {} work items:", results.len()),
        results,
        |r| {
            format!(
                "- [{}] {} ({}, {}, {})",
                r.field_text("system.id"),
                r.field_text("system.title"),
                r.field_text("system.workitemtype"),
                r.field_text("system.state"),
                r.project.name,
            )
        },
    )
}

// ============================================================================
// Search
// ============================================================================

pub fn code_search(results: &[CodeSearchResult]) -> String {
    if results.is_empty() {
        return "No code results found matching the search criteria".to_string();
    }
    listing(
        &format!("Found {} code results:", results.len()),
        results,
        |r| {
            format!(
                "- {} ({}/{}) - {} matches",
                r.path,
                r.project.name,
                r.repository.name,
                r.match_count(),
            )
        },
    )
}

// ============================================================================
// Repositories and pull requests
// ============================================================================

fn creator(pr: &GitPullRequest) -> &str {
    pr.created_by
        .as_ref()
        .map_or("Unknown", |c| c.display_name.as_str())
}

pub fn pull_requests(prs: &[GitPullRequest]) -> String {
    listing(&format!("Found {} pull requests:", prs.len()), prs, |pr| {
        format!(
            "- PR #{}: {} ({}) by {}\n  {} → {}",
            pr.pull_request_id,
            pr.title,
            pr.status,
            creator(pr),
            pr.source_ref_name,
            pr.target_ref_name,
        )
    })
}

pub fn project_pull_requests(project: &str, prs: &[GitPullRequest]) -> String {
    listing(
        &format!("Found {} pull requests in project '{project}':", prs.len()),
        prs,
        |pr| {
            let repo = pr.repository.as_ref().map_or("unknown", |r| r.name.as_str());
            format!("- #{}: {} (in {repo})", pr.pull_request_id, pr.title)
        },
    )
}

pub fn pull_request_created(pr: &GitPullRequest, source: &str, target: &str) -> String {
    format!(
        "Created PR #{}: {}\nSource: {source} → Target: {target}\nStatus: {}\nURL: {}",
        pr.pull_request_id,
        pr.title,
        pr.status,
        pr.url.as_deref().unwrap_or_default(),
    )
}

pub fn pull_request_status(pr: &GitPullRequest) -> String {
    format!("Updated PR #{} status to: {}", pr.pull_request_id, pr.status)
}

pub fn pull_request_details(pr: &GitPullRequest) -> String {
    let reviewers = pr
        .reviewers
        .iter()
        .map(|r| r.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Pull Request #{}: {}\nStatus: {}\nCreated By: {}\nSource Branch: {}\nTarget Branch: {}\n\
         Created: {}\nDescription: {}\nReviewers: {}",
        pr.pull_request_id,
        pr.title,
        pr.status,
        creator(pr),
        pr.source_ref_name,
        pr.target_ref_name,
        timestamp(pr.creation_date).unwrap_or_default(),
        or(pr.description.as_deref(), "No description"),
        if reviewers.is_empty() { "None" } else { &reviewers },
    )
}

pub fn branches(branches: &[GitRef]) -> String {
    listing(&format!("Found {} branches:", branches.len()), branches, |b| {
        let short: String = b.object_id.chars().take(8).collect();
        match &b.creator {
            Some(c) => format!("- {} ({short} by {})", b.branch_name(), c.display_name),
            None => format!("- {} ({short})", b.branch_name()),
        }
    })
}

pub fn branch(requested: &str, branch: Option<&GitRef>) -> String {
    branch.map_or_else(
        || format!("Branch '{requested}' not found."),
        |b| format!("Branch: {}\nCommit: {}", b.branch_name(), b.object_id),
    )
}

pub fn repositories(project: &str, repos: &[GitRepository]) -> String {
    listing(
        &format!("Found {} repositories in project '{project}':", repos.len()),
        repos,
        |r| {
            if r.is_disabled {
                format!("- {} (disabled)", r.name)
            } else {
                format!("- {}", r.name)
            }
        },
    )
}

pub fn repository(r: &GitRepository) -> String {
    format!(
        "Repository: {}\nID: {}\nDefault Branch: {}\nURL: {}",
        r.name,
        r.id,
        or(r.default_branch.as_deref(), "None"),
        r.web_url.as_deref().unwrap_or_default(),
    )
}

pub fn threads(pull_request_id: f64, threads: &[CommentThread]) -> String {
    listing(
        &format!("Found {} threads in PR #{pull_request_id}:", threads.len()),
        threads,
        |t| format!("- Thread {} (Status: {})", t.id, or(t.status.as_deref(), "unknown")),
    )
}

pub fn thread_comments(thread_id: f64, comments: &[PullRequestComment]) -> String {
    listing(
        &format!("Found {} comments in thread #{thread_id}:", comments.len()),
        comments,
        |c| {
            format!(
                "- [{}] {}: {}",
                c.id,
                c.author.as_ref().map_or("Unknown", |a| a.display_name.as_str()),
                c.content.as_deref().unwrap_or_default(),
            )
        },
    )
}

// ============================================================================
// Builds
// ============================================================================

fn build_url(build: &Build) -> &str {
    build
        .links
        .web
        .as_ref()
        .map_or("", |link| link.href.as_str())
}

pub fn build_started(build: &Build) -> String {
    format!(
        "Started build #{}\nDefinition: {}\nStatus: {}\nQueue Time: {}\nURL: {}",
        build.id,
        build.definition.name,
        or(build.status.as_deref(), "unknown"),
        timestamp(build.queue_time).unwrap_or_default(),
        build_url(build),
    )
}

pub fn build_status(build: &Build) -> String {
    format!(
        "Build #{}:\nDefinition: {}\nStatus: {}\nResult: {}\nStart Time: {}\nFinish Time: {}\n\
         Requested By: {}",
        build.id,
        build.definition.name,
        or(build.status.as_deref(), "unknown"),
        or(build.result.as_deref(), "In Progress"),
        timestamp(build.start_time).unwrap_or_else(|| "Not started".to_string()),
        timestamp(build.finish_time).unwrap_or_else(|| "Not finished".to_string()),
        build
            .requested_by
            .as_ref()
            .map_or("Unknown", |r| r.display_name.as_str()),
    )
}

pub fn build_definitions(definitions: &[BuildDefinitionReference]) -> String {
    listing(
        &format!("Found {} build definitions:", definitions.len()),
        definitions,
        |d| {
            format!(
                "- [{}] {} ({}){}",
                d.id,
                d.name,
                or(d.kind.as_deref(), "unknown"),
                folder_suffix(d.path.as_deref()),
            )
        },
    )
}

// ============================================================================
// Test plans
// ============================================================================

pub fn test_plans(plans: &[TestPlan]) -> String {
    listing(&format!("Found {} test plans:", plans.len()), plans, |p| {
        format!("- [{}] {} ({})", p.id, p.name, or(p.state.as_deref(), "unknown"))
    })
}

pub fn test_cases(cases: &[SuiteTestCase]) -> String {
    listing(
        &format!("Found {} test cases in suite:", cases.len()),
        cases,
        |c| {
            format!(
                "- [{}] {}",
                c.test_case.id,
                c.test_case.name.as_deref().unwrap_or("Unnamed"),
            )
        },
    )
}

fn result_line(r: &TestCaseResult) -> String {
    let outcome = r.outcome.as_deref().unwrap_or("Unknown");
    match r.error_message.as_deref().filter(|m| !m.is_empty()) {
        Some(error) => format!("- {}: {outcome} - {error}", r.title()),
        None => format!("- {}: {outcome}", r.title()),
    }
}

pub fn test_run_results(run_id: f64, results: &[TestCaseResult]) -> String {
    listing(&format!("Test results for run {run_id}:"), results, result_line)
}

pub fn build_test_results(build_id: f64, results: &[TestCaseResult]) -> String {
    let summary = TestOutcomeSummary::from_results(results);
    let mut out = format!(
        "Test results for build {build_id}:\nTotal: {}\nPassed: {}\nFailed: {}\nOther: {}\n\nDetails:",
        summary.total, summary.passed, summary.failed, summary.other,
    );
    for r in results.iter().take(BUILD_RESULT_DETAILS) {
        out.push('\n');
        out.push_str(&result_line(r));
    }
    if results.len() > BUILD_RESULT_DETAILS {
        let _ = write!(out, "\n\n... and {} more", results.len() - BUILD_RESULT_DETAILS);
    }
    out
}

// ============================================================================
// Releases
// ============================================================================

fn release_url(release: &Release) -> &str {
    release
        .links
        .web
        .as_ref()
        .map_or("", |link| link.href.as_str())
}

pub fn release_definitions(definitions: &[ReleaseDefinition]) -> String {
    listing(
        &format!("Found {} release definitions:", definitions.len()),
        definitions,
        |d| format!("- [{}] {}{}", d.id, d.name, folder_suffix(d.path.as_deref())),
    )
}

pub fn releases(releases: &[Release]) -> String {
    listing(&format!("Found {} releases:", releases.len()), releases, |r| {
        format!(
            "- [{}] {} - {} ({})",
            r.id,
            r.name,
            r.release_definition.as_ref().map_or("", |d| d.name.as_str()),
            or(r.status.as_deref(), "unknown"),
        )
    })
}

pub fn release_created(release: &Release) -> String {
    format!(
        "Created release: {} (ID: {})\nStatus: {}\nURL: {}",
        release.name,
        release.id,
        or(release.status.as_deref(), "unknown"),
        release_url(release),
    )
}

// ============================================================================
// Wikis
// ============================================================================

pub fn wikis(wikis: &[Wiki]) -> String {
    listing(&format!("Found {} wikis:", wikis.len()), wikis, |w| {
        format!("- {} ({})", w.name, or(w.kind.as_deref(), "unknown"))
    })
}

pub fn wiki_page(page: &VersionedWikiPage) -> String {
    format!(
        "Wiki Page: {}\nVersion: {}\n\nContent:\n{}",
        page.page.path,
        page.etag.as_deref().unwrap_or("unknown"),
        page.page.content.as_deref().unwrap_or_default(),
    )
}

// ============================================================================
// Iterations and areas
// ============================================================================

fn date(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.format("%Y-%m-%d").to_string())
}

pub fn iterations(iterations: &[TeamIteration]) -> String {
    listing(
        &format!("Found {} iterations:", iterations.len()),
        iterations,
        |i| {
            let attrs = i.attributes.as_ref();
            let start = date(attrs.and_then(|a| a.start_date));
            let finish = date(attrs.and_then(|a| a.finish_date));
            match (start, finish) {
                (Some(start), Some(finish)) => format!("- {} ({start} - {finish})", i.name),
                _ => format!("- {}", i.name),
            }
        },
    )
}

pub fn areas(root: &ClassificationNode) -> String {
    let nodes = root.flatten();
    listing(&format!("Found {} areas:", nodes.len()), &nodes, |(_, path)| {
        format!("- {path}")
    })
}

pub fn iteration_created(node: &ClassificationNode) -> String {
    let attrs = node.attributes.as_ref();
    match (
        date(attrs.and_then(|a| a.start_date)),
        date(attrs.and_then(|a| a.finish_date)),
    ) {
        (Some(start), Some(finish)) => {
            format!("Created iteration: {} ({start} to {finish})", node.name)
        }
        _ => format!("Created iteration: {}", node.name),
    }
}

pub fn area_created(node: &ClassificationNode) -> String {
    format!(
        "Created area: {} at path: {}",
        node.name,
        node.path.as_deref().unwrap_or(&node.name),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use serde_json::json;

    fn parse<T: DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_projects() {
        let list: Vec<TeamProject> = parse(json!([
            { "id": "1", "name": "Fabrikam", "description": "Main" },
            { "id": "2", "name": "Contoso", "description": "" }
        ]));
        assert_eq!(
            projects(&list),
            "Found 2 projects:\n- Fabrikam: Main\n- Contoso: No description"
        );
    }

    #[test]
    fn test_work_items_unassigned() {
        let items: Vec<WorkItem> = parse(json!([
            { "id": 7, "fields": {
                "System.Title": "Fix login",
                "System.WorkItemType": "Bug",
                "System.State": "Active"
            }},
            { "id": 8, "fields": {
                "System.Title": "Docs",
                "System.WorkItemType": "Task",
                "System.State": "New",
                "System.AssignedTo": { "displayName": "Ana" }
            }}
        ]));
        assert_eq!(
            work_items(&items),
            "Found 2 work items:\n- [7] Fix login (Bug, Active, Unassigned)\n- [8] Docs (Task, New, Ana)"
        );
    }

    #[test]
    fn test_query_results_empty() {
        assert_eq!(query_results(&[]), "Query returned no results");
    }

    #[test]
    fn test_work_item_details_fallbacks() {
        let wi: WorkItem = parse(json!({ "id": 3, "fields": {
            "System.Title": "T",
            "System.WorkItemType": "Task",
            "System.State": "New",
            "System.CreatedDate": "2024-05-01T10:00:00Z"
        }}));
        let text = work_item_details(&wi);
        assert!(text.starts_with("Work Item #3:\nTitle: T\n"));
        assert!(text.contains("Created: 2024-05-01 10:00:00 UTC"));
        assert!(text.contains("Tags: No tags"));
        assert!(text.ends_with("Description:\nNo description"));
    }

    #[test]
    fn test_work_item_updated_none() {
        assert_eq!(work_item_updated(None), "No updates provided");
    }

    #[test]
    fn test_pull_requests() {
        let prs: Vec<GitPullRequest> = parse(json!([{
            "pullRequestId": 12,
            "title": "Add cache",
            "status": "active",
            "createdBy": { "displayName": "Lee" },
            "sourceRefName": "refs/heads/feature",
            "targetRefName": "refs/heads/main"
        }]));
        assert_eq!(
            pull_requests(&prs),
            "Found 1 pull requests:\n- PR #12: Add cache (active) by Lee\n  refs/heads/feature → refs/heads/main"
        );
    }

    #[test]
    fn test_pull_request_details_no_reviewers() {
        let pr: GitPullRequest = parse(json!({
            "pullRequestId": 5,
            "title": "X",
            "status": "completed"
        }));
        let text = pull_request_details(&pr);
        assert!(text.contains("Created By: Unknown"));
        assert!(text.ends_with("Reviewers: None"));
    }

    #[test]
    fn test_branches_short_commit() {
        let refs: Vec<GitRef> = parse(json!([
            { "name": "refs/heads/main", "objectId": "0123456789abcdef", "creator": { "displayName": "Kim" } },
            { "name": "refs/heads/dev", "objectId": "fedcba9876543210" }
        ]));
        assert_eq!(
            branches(&refs),
            "Found 2 branches:\n- main (01234567 by Kim)\n- dev (fedcba98)"
        );
    }

    #[test]
    fn test_branch_not_found() {
        assert_eq!(branch("feature/x", None), "Branch 'feature/x' not found.");
    }

    #[test]
    fn test_build_status_pending() {
        let build: Build = parse(json!({
            "id": 99,
            "definition": { "id": 1, "name": "CI" },
            "status": "notStarted"
        }));
        assert_eq!(
            build_status(&build),
            "Build #99:\nDefinition: CI\nStatus: notStarted\nResult: In Progress\n\
             Start Time: Not started\nFinish Time: Not finished\nRequested By: Unknown"
        );
    }

    #[test]
    fn test_build_definitions_hide_root_folder() {
        let defs: Vec<BuildDefinitionReference> = parse(json!([
            { "id": 1, "name": "CI", "path": "\\", "type": "build" },
            { "id": 2, "name": "Nightly", "path": "\\Scheduled", "type": "build" }
        ]));
        assert_eq!(
            build_definitions(&defs),
            "Found 2 build definitions:\n- [1] CI (build)\n- [2] Nightly (build) in \\Scheduled"
        );
    }

    #[test]
    fn test_build_test_results_truncates() {
        let results: Vec<TestCaseResult> = (0..12)
            .map(|i| {
                parse(json!({
                    "id": i,
                    "testCaseTitle": format!("case {i}"),
                    "outcome": if i % 2 == 0 { "Passed" } else { "Failed" }
                }))
            })
            .collect();
        let text = build_test_results(4.0, &results);
        assert!(text.starts_with("Test results for build 4:\nTotal: 12\nPassed: 6\nFailed: 6\nOther: 0"));
        assert!(text.contains("- case 9: Failed"));
        assert!(!text.contains("- case 10:"));
        assert!(text.ends_with("... and 2 more"));
    }

    #[test]
    fn test_run_results_with_error() {
        let results: Vec<TestCaseResult> = parse(json!([
            { "id": 1, "testCase": { "name": "Login" }, "outcome": "Failed", "errorMessage": "timeout" }
        ]));
        assert_eq!(
            test_run_results(8.0, &results),
            "Test results for run 8:\n- Login: Failed - timeout"
        );
    }

    #[test]
    fn test_code_search_empty() {
        assert_eq!(
            code_search(&[]),
            "No code results found matching the search criteria"
        );
    }

    #[test]
    fn test_areas_flattened() {
        let root: ClassificationNode = parse(json!({
            "id": 1, "name": "Fabrikam",
            "children": [{ "id": 2, "name": "Web", "children": [{ "id": 3, "name": "UI" }] }]
        }));
        assert_eq!(
            areas(&root),
            "Found 3 areas:\n- Fabrikam\n- Fabrikam\\Web\n- Fabrikam\\Web\\UI"
        );
    }

    #[test]
    fn test_iterations_with_and_without_dates() {
        let list: Vec<TeamIteration> = parse(json!([
            { "id": "a", "name": "Sprint 1", "attributes": {
                "startDate": "2024-01-01T00:00:00Z", "finishDate": "2024-01-14T00:00:00Z"
            }},
            { "id": "b", "name": "Backlog" }
        ]));
        assert_eq!(
            iterations(&list),
            "Found 2 iterations:\n- Sprint 1 (2024-01-01 - 2024-01-14)\n- Backlog"
        );
    }

    #[test]
    fn test_wiki_page_version_is_etag() {
        let page = VersionedWikiPage {
            page: parse(json!({ "path": "/Home", "content": "# Hi" })),
            etag: Some("\"abc\"".to_string()),
        };
        assert_eq!(
            wiki_page(&page),
            "Wiki Page: /Home\nVersion: \"abc\"\n\nContent:\n# Hi"
        );
    }
}
