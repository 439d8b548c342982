//! Project operations.

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{ListResponse, TeamProject};
use crate::error::AppError;
use crate::validation::validate_path_segment;

impl DevOpsClient {
    /// Lists every project in the organization.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on rate limiting or API failure.
    pub async fn list_projects(&self) -> Result<Vec<TeamProject>, AppError> {
        let url = self.endpoint(Host::Core, &["_apis", "projects"])?;
        let list: ListResponse<TeamProject> = self.get(url).await?;
        Ok(list.value)
    }

    /// Gets one project by name or id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if `project_id` is invalid, or on rate limiting
    /// or API failure.
    pub async fn get_project(&self, project_id: &str) -> Result<TeamProject, AppError> {
        validate_path_segment(project_id, "Project ID")?;
        let url = self.endpoint(Host::Core, &["_apis", "projects", project_id])?;
        self.get(url).await
    }
}
