//! Full-text search over work items and code.

use serde_json::{json, Value};

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{CodeSearchResult, SearchResponse, WorkItemSearchResult};
use crate::error::AppError;
use crate::validation::{validate_project_name, validate_required_string, DEFAULT_MAX_STRING_LENGTH};

const SEARCH_API_VERSION: &str = "7.0-preview.1";

/// Work item search page size.
pub const WORK_ITEM_SEARCH_TOP: u32 = 50;

/// Code search page size.
pub const CODE_SEARCH_TOP: u32 = 25;

/// Request body shared by both search endpoints.
fn search_body(search_text: &str, top: u32, project_filter: Option<(&str, &str)>) -> Value {
    let mut body = json!({
        "searchText": search_text,
        "$skip": 0,
        "$top": top,
    });
    if let Some((key, project)) = project_filter {
        body["filters"] = json!({ key: [project] });
    }
    body
}

fn validate_search(search_text: &str, project: Option<&str>) -> Result<(), AppError> {
    validate_required_string(search_text, "Search text", DEFAULT_MAX_STRING_LENGTH)?;
    if let Some(project) = project.filter(|p| !p.is_empty()) {
        validate_project_name(project)?;
    }
    Ok(())
}

impl DevOpsClient {
    /// Searches work items by text, optionally within one project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn search_work_items(
        &self,
        search_text: &str,
        project: Option<&str>,
    ) -> Result<Vec<WorkItemSearchResult>, AppError> {
        validate_search(search_text, project)?;
        let project = project.filter(|p| !p.is_empty());

        let url = self.endpoint_with_version(
            Host::Search,
            &["_apis", "search", "workitemsearchresults"],
            SEARCH_API_VERSION,
        )?;
        let body = search_body(
            search_text,
            WORK_ITEM_SEARCH_TOP,
            project.map(|p| ("System.TeamProject", p)),
        );
        let response: SearchResponse<WorkItemSearchResult> = self.post(url, &body).await?;
        Ok(response.results)
    }

    /// Searches code by text, optionally within one project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn search_code(
        &self,
        search_text: &str,
        project: Option<&str>,
    ) -> Result<Vec<CodeSearchResult>, AppError> {
        validate_search(search_text, project)?;
        let project = project.filter(|p| !p.is_empty());

        let url = self.endpoint_with_version(
            Host::Search,
            &["_apis", "search", "codesearchresults"],
            SEARCH_API_VERSION,
        )?;
        let body = search_body(search_text, CODE_SEARCH_TOP, project.map(|p| ("Project", p)));
        let response: SearchResponse<CodeSearchResult> = self.post(url, &body).await?;
        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body_without_project() {
        let body = search_body("login", 25, None);
        assert_eq!(body, json!({ "searchText": "login", "$skip": 0, "$top": 25 }));
    }

    #[test]
    fn test_search_body_with_project_filter() {
        let body = search_body("login", 50, Some(("System.TeamProject", "Alpha")));
        assert_eq!(body["filters"], json!({ "System.TeamProject": ["Alpha"] }));
    }

    #[test]
    fn test_validate_search_project_filter() {
        assert!(validate_search("login", None).is_ok());
        assert!(validate_search("login", Some("")).is_ok());
        assert!(validate_search("login", Some("Alpha")).is_ok());
        assert!(matches!(
            validate_search("login", Some("../secrets")),
            Err(AppError::Validation(crate::error::ValidationError::PathTraversal { .. }))
        ));
    }
}
