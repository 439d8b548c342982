//! Wiki operations.

use reqwest::Url;
use serde_json::json;

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{ListResponse, VersionedWikiPage, Wiki, WikiPage};
use crate::error::{ApiError, AppError, ValidationError};
use crate::validation::{
    validate_path_segment, validate_project_name, validate_required_string,
    validate_string_input, DEFAULT_MAX_STRING_LENGTH, MAX_LARGE_TEXT_LENGTH, MAX_NAME_LENGTH,
};

fn validate_page(project: &str, wiki: &str, path: &str) -> Result<(), ValidationError> {
    validate_project_name(project)?;
    validate_path_segment(wiki, "Wiki identifier")?;
    validate_required_string(path, "Page path", DEFAULT_MAX_STRING_LENGTH)
}

impl DevOpsClient {
    /// `{project}/_apis/wiki/wikis/{wiki}/pages?path={path}`
    fn page_url(&self, project: &str, wiki: &str, path: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(
            Host::Core,
            &[project, "_apis", "wiki", "wikis", wiki, "pages"],
        )?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(url)
    }

    /// Lists the wikis of a project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_wikis(&self, project: &str) -> Result<Vec<Wiki>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "wiki", "wikis"])?;
        let list: ListResponse<Wiki> = self.get(url).await?;
        Ok(list.value)
    }

    /// Reads a page with its content and current version.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_wiki_page(
        &self,
        project: &str,
        wiki: &str,
        path: &str,
    ) -> Result<VersionedWikiPage, AppError> {
        validate_page(project, wiki, path)?;
        let mut url = self.page_url(project, wiki, path)?;
        url.query_pairs_mut().append_pair("includeContent", "true");
        let (page, etag) = self.get_with_etag(url).await?;
        Ok(VersionedWikiPage { page, etag })
    }

    /// Creates a page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    /// An existing page at `path` is reported by the service as a conflict.
    pub async fn create_wiki_page(
        &self,
        project: &str,
        wiki: &str,
        path: &str,
        content: &str,
    ) -> Result<WikiPage, AppError> {
        validate_page(project, wiki, path)?;
        validate_string_input(content, "Content", MAX_LARGE_TEXT_LENGTH)?;
        let url = self.page_url(project, wiki, path)?;
        self.put(url, &json!({ "content": content }), None).await
    }

    /// Replaces a page's content.
    ///
    /// `version` is the `ETag` from [`get_wiki_page`](Self::get_wiki_page);
    /// the service rejects the write if the page changed since.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn update_wiki_page(
        &self,
        project: &str,
        wiki: &str,
        path: &str,
        content: &str,
        version: &str,
    ) -> Result<WikiPage, AppError> {
        validate_page(project, wiki, path)?;
        validate_string_input(content, "Content", MAX_LARGE_TEXT_LENGTH)?;
        validate_required_string(version, "Version", MAX_NAME_LENGTH)?;
        let url = self.page_url(project, wiki, path)?;
        self.put(url, &json!({ "content": content }), Some(version)).await
    }
}
