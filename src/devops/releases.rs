//! Release management operations. These live on the release host.

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{ListResponse, Release, ReleaseDefinition, ReleaseEnvironment};
use crate::error::AppError;
use crate::validation::{
    validate_id, validate_optional_string, validate_project_name, DEFAULT_MAX_STRING_LENGTH,
};

const DEPLOY_API_VERSION: &str = "7.0-preview.7";

impl DevOpsClient {
    /// Lists release definitions.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_release_definitions(
        &self,
        project: &str,
    ) -> Result<Vec<ReleaseDefinition>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Release, &[project, "_apis", "release", "definitions"])?;
        let list: ListResponse<ReleaseDefinition> = self.get(url).await?;
        Ok(list.value)
    }

    /// Lists releases, optionally of one definition.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_releases(
        &self,
        project: &str,
        definition_id: Option<f64>,
    ) -> Result<Vec<Release>, AppError> {
        validate_project_name(project)?;
        let definition = definition_id
            .map(|id| validate_id(id, "release definition ID"))
            .transpose()?;

        let mut url = self.endpoint(Host::Release, &[project, "_apis", "release", "releases"])?;
        if let Some(definition) = definition {
            url.query_pairs_mut()
                .append_pair("definitionId", &definition.to_string());
        }
        let list: ListResponse<Release> = self.get(url).await?;
        Ok(list.value)
    }

    /// Creates a release from a definition.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_release(
        &self,
        project: &str,
        definition_id: f64,
        description: Option<&str>,
    ) -> Result<Release, AppError> {
        validate_project_name(project)?;
        let definition = validate_id(definition_id, "release definition ID")?;
        validate_optional_string(description, "Description", DEFAULT_MAX_STRING_LENGTH)?;

        let description = description.filter(|d| !d.is_empty()).map_or_else(
            || {
                format!(
                    "Release created at {}",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
                )
            },
            str::to_string,
        );

        let url = self.endpoint(Host::Release, &[project, "_apis", "release", "releases"])?;
        let body = json!({
            "definitionId": definition,
            "description": description,
            "isDraft": false,
            "manualEnvironments": [],
        });
        self.post(url, &body).await
    }

    /// Starts deployment of a release to one environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn deploy_release(
        &self,
        project: &str,
        release_id: f64,
        environment_id: f64,
    ) -> Result<ReleaseEnvironment, AppError> {
        validate_project_name(project)?;
        let release = validate_id(release_id, "release ID")?;
        let environment = validate_id(environment_id, "environment ID")?;

        let url = self.endpoint_with_version(
            Host::Release,
            &[
                project,
                "_apis",
                "release",
                "releases",
                &release.to_string(),
                "environments",
                &environment.to_string(),
            ],
            DEPLOY_API_VERSION,
        )?;
        let body = json!({
            "status": "inProgress",
            "comment": "Deployment triggered via MCP",
        });
        self.patch(url, &body).await
    }
}
