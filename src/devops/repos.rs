//! Git repository, branch and pull request operations.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde_json::json;

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{
    CommentThread, GitPullRequest, GitRef, GitRepository, ListResponse, PullRequestComment,
};
use crate::error::{ApiError, AppError, ValidationError};
use crate::validation::{
    validate_branch_name, validate_id, validate_optional_string, validate_path_segment,
    validate_project_name, validate_required_string,
    MAX_LARGE_TEXT_LENGTH, MAX_NAME_LENGTH, MAX_PR_DESCRIPTION_LENGTH, MAX_PR_TITLE_LENGTH,
};

const HEADS_PREFIX: &str = "refs/heads/";

/// Target status for [`DevOpsClient::update_pull_request_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestStatus {
    /// Reactivate.
    Active,
    /// Abandon without merging.
    Abandoned,
    /// Merge.
    Completed,
}

impl PullRequestStatus {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for PullRequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "abandoned" => Ok(Self::Abandoned),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidFormat {
                field: "pull request status".to_string(),
                reason: "must be one of active, abandoned, completed".to_string(),
            }),
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request to open.
#[derive(Debug, Clone, Copy)]
pub struct NewPullRequest<'a> {
    /// Branch to merge from, with or without `refs/heads/`.
    pub source_branch: &'a str,
    /// Branch to merge into, with or without `refs/heads/`.
    pub target_branch: &'a str,
    /// Title.
    pub title: &'a str,
    /// Optional description.
    pub description: Option<&'a str>,
}

/// Strips `refs/heads/` and checks the remaining branch name.
fn normalize_branch<'a>(branch: &'a str, label: &str) -> Result<&'a str, ValidationError> {
    let name = branch.strip_prefix(HEADS_PREFIX).unwrap_or(branch);
    validate_required_string(name, label, MAX_NAME_LENGTH)?;
    validate_branch_name(name)?;
    Ok(name)
}

fn validate_repository(project: &str, repository: &str) -> Result<(), ValidationError> {
    validate_project_name(project)?;
    validate_path_segment(repository, "Repository name")
}

impl DevOpsClient {
    /// `{project}/_apis/git/repositories/{repository}/{tail...}`
    fn repository_url(&self, project: &str, repository: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut segments = vec![project, "_apis", "git", "repositories", repository];
        segments.extend_from_slice(tail);
        self.endpoint(Host::Core, &segments)
    }

    /// Lists pull requests in a repository, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_pull_requests(
        &self,
        project: &str,
        repository: &str,
        status: Option<&str>,
    ) -> Result<Vec<GitPullRequest>, AppError> {
        validate_repository(project, repository)?;
        validate_optional_string(status, "Status", MAX_NAME_LENGTH)?;

        let mut url = self.repository_url(project, repository, &["pullrequests"])?;
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("searchCriteria.status", status);
        }
        let list: ListResponse<GitPullRequest> = self.get(url).await?;
        Ok(list.value)
    }

    /// Lists pull requests across every repository in a project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_pull_requests_by_project(
        &self,
        project: &str,
    ) -> Result<Vec<GitPullRequest>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "git", "pullrequests"])?;
        let list: ListResponse<GitPullRequest> = self.get(url).await?;
        Ok(list.value)
    }

    /// Opens a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_pull_request(
        &self,
        project: &str,
        repository: &str,
        pr: NewPullRequest<'_>,
    ) -> Result<GitPullRequest, AppError> {
        validate_repository(project, repository)?;
        let source = normalize_branch(pr.source_branch, "Source branch")?;
        let target = normalize_branch(pr.target_branch, "Target branch")?;
        validate_required_string(pr.title, "PR title", MAX_PR_TITLE_LENGTH)?;
        validate_optional_string(pr.description, "PR description", MAX_PR_DESCRIPTION_LENGTH)?;

        let url = self.repository_url(project, repository, &["pullrequests"])?;
        let body = json!({
            "sourceRefName": format!("{HEADS_PREFIX}{source}"),
            "targetRefName": format!("{HEADS_PREFIX}{target}"),
            "title": pr.title,
            "description": pr.description.unwrap_or_default(),
        });
        self.post(url, &body).await
    }

    /// Gets one pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_pull_request(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
    ) -> Result<GitPullRequest, AppError> {
        validate_repository(project, repository)?;
        let id = validate_id(pull_request_id, "pull request ID")?;
        let url = self.repository_url(project, repository, &["pullrequests", &id.to_string()])?;
        self.get(url).await
    }

    /// Moves a pull request to `status`.
    ///
    /// Completing needs the source commit the merge is based on, so the
    /// pull request is read first in that case.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn update_pull_request_status(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
        status: &str,
    ) -> Result<GitPullRequest, AppError> {
        validate_repository(project, repository)?;
        let id = validate_id(pull_request_id, "pull request ID")?;
        let status: PullRequestStatus = status.parse()?;

        let body = if status == PullRequestStatus::Completed {
            let current = self.get_pull_request(project, repository, f64::from(id)).await?;
            let commit = current.last_merge_source_commit.ok_or_else(|| {
                ApiError::UnexpectedResponse {
                    message: format!("pull request #{id} has no merge source commit"),
                }
            })?;
            json!({ "status": status.as_str(), "lastMergeSourceCommit": commit })
        } else {
            json!({ "status": status.as_str() })
        };

        let url = self.repository_url(project, repository, &["pullrequests", &id.to_string()])?;
        self.patch(url, &body).await
    }

    /// Lists the branches of a repository.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_branches(&self, project: &str, repository: &str) -> Result<Vec<GitRef>, AppError> {
        validate_repository(project, repository)?;
        let mut url = self.repository_url(project, repository, &["refs"])?;
        url.query_pairs_mut().append_pair("filter", "heads/");
        let list: ListResponse<GitRef> = self.get(url).await?;
        Ok(list.value)
    }

    /// Finds a branch by exact name. `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_branch(
        &self,
        project: &str,
        repository: &str,
        branch_name: &str,
    ) -> Result<Option<GitRef>, AppError> {
        validate_repository(project, repository)?;
        let name = normalize_branch(branch_name, "Branch name")?;

        // The filter is a prefix match.
        let mut url = self.repository_url(project, repository, &["refs"])?;
        url.query_pairs_mut().append_pair("filter", &format!("heads/{name}"));
        let list: ListResponse<GitRef> = self.get(url).await?;
        Ok(list.value.into_iter().find(|r| r.branch_name() == name))
    }

    /// Lists the repositories of a project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_repositories(&self, project: &str) -> Result<Vec<GitRepository>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "git", "repositories"])?;
        let list: ListResponse<GitRepository> = self.get(url).await?;
        Ok(list.value)
    }

    /// Gets a repository by name or id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_repository(
        &self,
        project: &str,
        repo_id_or_name: &str,
    ) -> Result<GitRepository, AppError> {
        validate_project_name(project)?;
        validate_path_segment(repo_id_or_name, "Repository name or ID")?;
        let url = self.repository_url(project, repo_id_or_name, &[])?;
        self.get(url).await
    }

    /// Lists the comment threads of a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_pull_request_threads(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
    ) -> Result<Vec<CommentThread>, AppError> {
        validate_repository(project, repository)?;
        let pr = validate_id(pull_request_id, "pull request ID")?;
        let url = self.repository_url(
            project,
            repository,
            &["pullrequests", &pr.to_string(), "threads"],
        )?;
        let list: ListResponse<CommentThread> = self.get(url).await?;
        Ok(list.value)
    }

    /// Lists the comments in one thread.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_pull_request_thread_comments(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
        thread_id: f64,
    ) -> Result<Vec<PullRequestComment>, AppError> {
        validate_repository(project, repository)?;
        let pr = validate_id(pull_request_id, "pull request ID")?;
        let thread = validate_id(thread_id, "thread ID")?;
        let url = self.repository_url(
            project,
            repository,
            &["pullrequests", &pr.to_string(), "threads", &thread.to_string(), "comments"],
        )?;
        let list: ListResponse<PullRequestComment> = self.get(url).await?;
        Ok(list.value)
    }

    /// Posts a text reply in a thread.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn reply_to_comment(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
        thread_id: f64,
        content: &str,
    ) -> Result<PullRequestComment, AppError> {
        validate_repository(project, repository)?;
        let pr = validate_id(pull_request_id, "pull request ID")?;
        let thread = validate_id(thread_id, "thread ID")?;
        validate_required_string(content, "Comment", MAX_LARGE_TEXT_LENGTH)?;

        let url = self.repository_url(
            project,
            repository,
            &["pullrequests", &pr.to_string(), "threads", &thread.to_string(), "comments"],
        )?;
        // commentType 1 is plain text.
        self.post(url, &json!({ "content": content, "commentType": 1 })).await
    }

    /// Marks a thread as closed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn resolve_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: f64,
        thread_id: f64,
    ) -> Result<CommentThread, AppError> {
        validate_repository(project, repository)?;
        let pr = validate_id(pull_request_id, "pull request ID")?;
        let thread = validate_id(thread_id, "thread ID")?;
        let url = self.repository_url(
            project,
            repository,
            &["pullrequests", &pr.to_string(), "threads", &thread.to_string()],
        )?;
        self.patch(url, &json!({ "status": "closed" })).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("active", PullRequestStatus::Active ; "active")]
    #[test_case("Abandoned", PullRequestStatus::Abandoned ; "capitalized")]
    #[test_case(" completed ", PullRequestStatus::Completed ; "padded")]
    fn test_status_parse(input: &str, expected: PullRequestStatus) {
        assert_eq!(input.parse::<PullRequestStatus>().unwrap(), expected);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "merged".parse::<PullRequestStatus>().unwrap_err();
        assert!(err.to_string().contains("active, abandoned, completed"));
    }

    #[test]
    fn test_normalize_branch() {
        assert_eq!(normalize_branch("refs/heads/main", "Branch").unwrap(), "main");
        assert_eq!(normalize_branch("feature/x", "Branch").unwrap(), "feature/x");
        assert!(normalize_branch("bad branch", "Branch").is_err());
        assert!(normalize_branch("refs/heads/", "Branch").is_err());
    }
}
