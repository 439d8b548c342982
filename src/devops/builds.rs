//! Build operations.

use serde_json::json;

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{Build, BuildDefinitionReference, ListResponse};
use crate::error::AppError;
use crate::validation::{
    validate_branch_name, validate_id, validate_project_name, validate_string_input,
    MAX_NAME_LENGTH,
};

impl DevOpsClient {
    /// Queues a build of a definition, optionally for a specific branch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn run_build(
        &self,
        project: &str,
        definition_id: f64,
        source_branch: Option<&str>,
    ) -> Result<Build, AppError> {
        validate_project_name(project)?;
        let definition_id = validate_id(definition_id, "build definition ID")?;

        let mut body = json!({ "definition": { "id": definition_id } });
        if let Some(branch) = source_branch.filter(|b| !b.is_empty()) {
            let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            validate_string_input(branch, "Source branch", MAX_NAME_LENGTH)?;
            validate_branch_name(branch)?;
            body["sourceBranch"] = json!(format!("refs/heads/{branch}"));
        }

        let url = self.endpoint(Host::Core, &[project, "_apis", "build", "builds"])?;
        self.post(url, &body).await
    }

    /// Gets a build.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_build(&self, project: &str, build_id: f64) -> Result<Build, AppError> {
        validate_project_name(project)?;
        let id = validate_id(build_id, "build ID")?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "build", "builds", &id.to_string()])?;
        self.get(url).await
    }

    /// Lists build definitions.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_build_definitions(
        &self,
        project: &str,
    ) -> Result<Vec<BuildDefinitionReference>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "build", "definitions"])?;
        let list: ListResponse<BuildDefinitionReference> = self.get(url).await?;
        Ok(list.value)
    }
}
