//! Iteration and area operations.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{ClassificationNode, ListResponse, TeamIteration};
use crate::error::{AppError, ValidationError};
use crate::validation::{
    validate_optional_string, validate_project_name, validate_required_string,
    DEFAULT_MAX_STRING_LENGTH, MAX_NAME_LENGTH,
};

/// Depth of the area tree fetched by [`DevOpsClient::list_areas`].
pub const AREA_TREE_DEPTH: u32 = 10;

/// Start and finish of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationDates {
    /// First day.
    pub start: DateTime<Utc>,
    /// Last day.
    pub finish: DateTime<Utc>,
}

impl IterationDates {
    /// Parses an optional date pair. Both or neither must be given.
    ///
    /// Dates are `YYYY-MM-DD` (midnight UTC) or RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFormat`] if only one date is
    /// given, a date does not parse, or the finish precedes the start.
    pub fn parse(start: Option<&str>, finish: Option<&str>) -> Result<Option<Self>, ValidationError> {
        let start = start.filter(|s| !s.trim().is_empty());
        let finish = finish.filter(|s| !s.trim().is_empty());

        match (start, finish) {
            (None, None) => Ok(None),
            (Some(start), Some(finish)) => {
                let start = parse_date(start, "start date")?;
                let finish = parse_date(finish, "finish date")?;
                if finish < start {
                    return Err(ValidationError::InvalidFormat {
                        field: "finish date".to_string(),
                        reason: "must not be before the start date".to_string(),
                    });
                }
                Ok(Some(Self { start, finish }))
            }
            _ => Err(ValidationError::InvalidFormat {
                field: "iteration dates".to_string(),
                reason: "give both startDate and finishDate, or neither".to_string(),
            }),
        }
    }

    fn to_attributes(self) -> Value {
        json!({
            "startDate": self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "finishDate": self.finish.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

fn parse_date(value: &str, field: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or RFC 3339".to_string(),
        })
}

/// Splits a parent node path on `/` or `\` into URL segments.
fn parent_segments(path: Option<&str>) -> Result<Vec<&str>, ValidationError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    validate_optional_string(Some(path), "Parent path", DEFAULT_MAX_STRING_LENGTH)?;

    path.split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment == "." || segment == ".." {
                Err(ValidationError::PathTraversal {
                    field: "parent path".to_string(),
                })
            } else {
                Ok(segment)
            }
        })
        .collect()
}

impl DevOpsClient {
    /// Lists the default team's iterations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_iterations(&self, project: &str) -> Result<Vec<TeamIteration>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(
            Host::Core,
            &[project, "_apis", "work", "teamsettings", "iterations"],
        )?;
        let list: ListResponse<TeamIteration> = self.get(url).await?;
        Ok(list.value)
    }

    /// Fetches the area tree rooted at the project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_areas(&self, project: &str) -> Result<ClassificationNode, AppError> {
        validate_project_name(project)?;
        let mut url = self.endpoint(
            Host::Core,
            &[project, "_apis", "wit", "classificationnodes", "areas"],
        )?;
        url.query_pairs_mut()
            .append_pair("$depth", &AREA_TREE_DEPTH.to_string());
        self.get(url).await
    }

    /// Creates an iteration, under `parent_path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_iteration(
        &self,
        project: &str,
        name: &str,
        dates: Option<IterationDates>,
        parent_path: Option<&str>,
    ) -> Result<ClassificationNode, AppError> {
        validate_project_name(project)?;
        validate_required_string(name, "Iteration name", MAX_NAME_LENGTH)?;

        let mut body = json!({ "name": name });
        if let Some(dates) = dates {
            body["attributes"] = dates.to_attributes();
        }
        self.create_classification_node(project, "iterations", parent_path, &body)
            .await
    }

    /// Creates an area, under `parent_path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_area(
        &self,
        project: &str,
        name: &str,
        parent_path: Option<&str>,
    ) -> Result<ClassificationNode, AppError> {
        validate_project_name(project)?;
        validate_required_string(name, "Area name", MAX_NAME_LENGTH)?;
        self.create_classification_node(project, "areas", parent_path, &json!({ "name": name }))
            .await
    }

    async fn create_classification_node(
        &self,
        project: &str,
        group: &str,
        parent_path: Option<&str>,
        body: &Value,
    ) -> Result<ClassificationNode, AppError> {
        let parents = parent_segments(parent_path)?;
        let mut segments = vec![project, "_apis", "wit", "classificationnodes", group];
        segments.extend(parents);
        let url = self.endpoint(Host::Core, &segments)?;
        self.post(url, body).await
    }
}
