//! Work item operations: WIQL queries, CRUD, comments and links.

use std::fmt;

use reqwest::Method;
use serde_json::{json, Map, Value};

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{
    CommentList, ListResponse, PatchOperation, WiqlResult, WorkItem, WorkItemComment,
};
use crate::error::{AppError, ValidationError};
use crate::validation::{
    escape_query_literal, validate_id, validate_optional_string, validate_path_segment,
    validate_project_name,
    validate_required_string, validate_string_input, validate_work_item_id,
    DEFAULT_MAX_STRING_LENGTH, MAX_LARGE_TEXT_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH,
};

/// `api-version` of the work item comments endpoints.
const COMMENTS_API_VERSION: &str = "7.0-preview.3";

/// Items returned by `list_work_items` without a custom query.
pub const DEFAULT_WORK_ITEM_LIMIT: usize = 20;

/// The batch endpoint accepts at most this many ids per call.
const BATCH_SIZE: usize = 200;

/// Relationship kinds accepted by [`DevOpsClient::link_work_items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Non-hierarchical association.
    Related,
    /// Target becomes the parent of the source.
    Parent,
    /// Target becomes a child of the source.
    Child,
    /// Target precedes the source.
    Predecessor,
    /// Target succeeds the source.
    Successor,
}

impl LinkType {
    /// Resolves a display name, ignoring case. Unknown names fall back to
    /// [`LinkType::Related`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "parent" => Self::Parent,
            "child" => Self::Child,
            "predecessor" => Self::Predecessor,
            "successor" => Self::Successor,
            _ => Self::Related,
        }
    }

    /// The relation type reference name.
    #[must_use]
    pub const fn reference_name(self) -> &'static str {
        match self {
            Self::Related => "System.LinkTypes.Related",
            Self::Parent => "System.LinkTypes.Hierarchy-Reverse",
            Self::Child => "System.LinkTypes.Hierarchy-Forward",
            Self::Predecessor => "System.LinkTypes.Dependency-Reverse",
            Self::Successor => "System.LinkTypes.Dependency-Forward",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Related => "Related",
            Self::Parent => "Parent",
            Self::Child => "Child",
            Self::Predecessor => "Predecessor",
            Self::Successor => "Successor",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field changes for [`DevOpsClient::update_work_item`]. Empty strings
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemUpdate {
    /// New title.
    pub title: Option<String>,
    /// New HTML description.
    pub description: Option<String>,
    /// New state, e.g. `Active`.
    pub state: Option<String>,
    /// New assignee (display or unique name).
    pub assigned_to: Option<String>,
}

impl WorkItemUpdate {
    /// Validates every present field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TooLong`] for an oversized field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_string(self.title.as_deref(), "Title", MAX_TITLE_LENGTH)?;
        validate_optional_string(self.description.as_deref(), "Description", MAX_LARGE_TEXT_LENGTH)?;
        validate_optional_string(self.state.as_deref(), "State", MAX_NAME_LENGTH)?;
        validate_optional_string(self.assigned_to.as_deref(), "Assigned to", MAX_NAME_LENGTH)
    }

    /// `replace` operations for the present fields, in a fixed order.
    #[must_use]
    pub fn to_operations(&self) -> Vec<PatchOperation> {
        [
            ("System.Title", &self.title),
            ("System.Description", &self.description),
            ("System.State", &self.state),
            ("System.AssignedTo", &self.assigned_to),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| PatchOperation::replace_field(field, v))
        })
        .collect()
    }
}

/// Maps a short field name to its reference name. Names containing a dot
/// are taken as reference names already.
fn field_reference_name(name: &str) -> Result<String, ValidationError> {
    if name.contains('.') {
        return Ok(name.to_string());
    }
    let reference = match name {
        "title" => "System.Title",
        "description" => "System.Description",
        "assignedTo" => "System.AssignedTo",
        "state" => "System.State",
        "tags" => "System.Tags",
        "areaPath" => "System.AreaPath",
        "iterationPath" => "System.IterationPath",
        "priority" => "Microsoft.VSTS.Common.Priority",
        other => {
            return Err(ValidationError::InvalidFormat {
                field: "work item field".to_string(),
                reason: format!(
                    "unknown field '{other}', use a short name such as 'title' or a reference name such as 'System.Title'"
                ),
            })
        }
    };
    Ok(reference.to_string())
}

/// Fields that only take text.
const TEXT_FIELDS: [&str; 7] = [
    "System.Title",
    "System.Description",
    "System.AssignedTo",
    "System.State",
    "System.Tags",
    "System.AreaPath",
    "System.IterationPath",
];

const PRIORITY_FIELD: &str = "Microsoft.VSTS.Common.Priority";

/// Checks a field value's JSON type and size. Arrays and objects are never
/// accepted, so every value is either bounded text or a scalar.
fn check_field_value(reference: &str, value: &Value) -> Result<(), ValidationError> {
    let text_only = TEXT_FIELDS.contains(&reference);
    let number_only = reference == PRIORITY_FIELD;

    let expected = match value {
        Value::String(text) if !number_only => {
            return validate_string_input(text, reference, MAX_LARGE_TEXT_LENGTH);
        }
        Value::Number(_) if !text_only => return Ok(()),
        Value::Bool(_) if !text_only && !number_only => return Ok(()),
        _ if text_only => "text",
        _ if number_only => "a number",
        _ => "text, a number or a boolean",
    };
    Err(ValidationError::InvalidFormat {
        field: reference.to_string(),
        reason: format!("value must be {expected}"),
    })
}

/// Builds the `add` operations for a new work item.
fn creation_operations(fields: &Map<String, Value>) -> Result<Vec<PatchOperation>, ValidationError> {
    let mut title = None;
    let mut operations = Vec::with_capacity(fields.len());

    for (name, value) in fields {
        if value.is_null() {
            continue;
        }
        let reference = field_reference_name(name)?;
        check_field_value(&reference, value)?;
        if reference == "System.Title" {
            if let Some(text) = value.as_str() {
                validate_required_string(text, "Title", MAX_TITLE_LENGTH)?;
                title = Some(text);
            }
        }
        operations.push(PatchOperation::add_field(&reference, value.clone()));
    }

    if title.is_none() {
        return Err(ValidationError::Required {
            field: "Title".to_string(),
        });
    }

    operations.sort_by_key(|op| op.path != "/fields/System.Title");
    Ok(operations)
}

impl DevOpsClient {
    /// Lists work items in a project.
    ///
    /// With `query`, runs that WIQL in the project's scope. Without it,
    /// returns the [`DEFAULT_WORK_ITEM_LIMIT`] most recently changed items.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_work_items(
        &self,
        project: &str,
        query: Option<&str>,
    ) -> Result<Vec<WorkItem>, AppError> {
        validate_project_name(project)?;
        validate_optional_string(query, "WIQL query", MAX_LARGE_TEXT_LENGTH)?;

        match query.filter(|q| !q.trim().is_empty()) {
            Some(query) => {
                let ids = self.wiql(Some(project), query, None).await?;
                self.fetch_work_items(&ids).await
            }
            None => {
                let query = format!(
                    "SELECT [System.Id], [System.Title], [System.State] \
                     FROM WorkItems \
                     WHERE [System.TeamProject] = '{}' \
                     ORDER BY [System.ChangedDate] DESC",
                    escape_query_literal(project)
                );
                let mut ids = self
                    .wiql(Some(project), &query, Some(DEFAULT_WORK_ITEM_LIMIT))
                    .await?;
                ids.truncate(DEFAULT_WORK_ITEM_LIMIT);
                self.fetch_work_items(&ids).await
            }
        }
    }

    /// Lists the open and closed work items assigned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn my_work_items(&self, project: &str) -> Result<Vec<WorkItem>, AppError> {
        validate_project_name(project)?;
        let query = format!(
            "SELECT [System.Id] FROM WorkItems \
             WHERE [System.TeamProject] = '{}' AND [System.AssignedTo] = @Me \
             ORDER BY [System.ChangedDate] DESC",
            escape_query_literal(project)
        );
        let ids = self.wiql(Some(project), &query, None).await?;
        self.fetch_work_items(&ids).await
    }

    /// Lists the work items scheduled in an iteration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn work_items_for_iteration(
        &self,
        project: &str,
        iteration_path: &str,
    ) -> Result<Vec<WorkItem>, AppError> {
        validate_project_name(project)?;
        validate_required_string(iteration_path, "Iteration path", DEFAULT_MAX_STRING_LENGTH)?;
        let query = format!(
            "SELECT [System.Id] FROM WorkItems \
             WHERE [System.TeamProject] = '{}' AND [System.IterationPath] = '{}' \
             ORDER BY [System.Id]",
            escape_query_literal(project),
            escape_query_literal(iteration_path)
        );
        let ids = self.wiql(Some(project), &query, None).await?;
        self.fetch_work_items(&ids).await
    }

    /// Runs an organization-wide WIQL query.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn run_query(&self, query: &str) -> Result<Vec<WorkItem>, AppError> {
        validate_required_string(query, "WIQL query", MAX_LARGE_TEXT_LENGTH)?;
        let ids = self.wiql(None, query, None).await?;
        self.fetch_work_items(&ids).await
    }

    /// Gets a work item with relations and links expanded.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_work_item(&self, id: f64) -> Result<WorkItem, AppError> {
        let id = validate_work_item_id(id)?;
        let mut url = self.endpoint(Host::Core, &["_apis", "wit", "workitems", &id.to_string()])?;
        url.query_pairs_mut().append_pair("$expand", "all");
        self.get(url).await
    }

    /// Applies `update` to a work item.
    ///
    /// Returns `None` without issuing a request when no field is set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn update_work_item(
        &self,
        id: f64,
        update: &WorkItemUpdate,
    ) -> Result<Option<WorkItem>, AppError> {
        let id = validate_work_item_id(id)?;
        update.validate()?;

        let operations = update.to_operations();
        if operations.is_empty() {
            return Ok(None);
        }

        let url = self.endpoint(Host::Core, &["_apis", "wit", "workitems", &id.to_string()])?;
        self.json_patch(Method::PATCH, url, &operations).await.map(Some)
    }

    /// Creates a work item of `work_item_type` from a field map.
    ///
    /// Keys are short names (`title`, `description`, `assignedTo`, `state`,
    /// `tags`, `areaPath`, `iterationPath`, `priority`) or reference names
    /// such as `Microsoft.VSTS.Scheduling.StoryPoints`. A title is required.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_work_item(
        &self,
        project: &str,
        work_item_type: &str,
        fields: &Map<String, Value>,
    ) -> Result<WorkItem, AppError> {
        validate_project_name(project)?;
        validate_path_segment(work_item_type, "Work item type")?;
        let operations = creation_operations(fields)?;

        let type_segment = format!("${work_item_type}");
        let url = self.endpoint(Host::Core, &[project, "_apis", "wit", "workitems", &type_segment])?;
        self.json_patch(Method::POST, url, &operations).await
    }

    /// Lists comments on a work item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_work_item_comments(&self, id: f64) -> Result<CommentList, AppError> {
        let id = validate_work_item_id(id)?;
        let url = self.endpoint_with_version(
            Host::Core,
            &["_apis", "wit", "workItems", &id.to_string(), "comments"],
            COMMENTS_API_VERSION,
        )?;
        self.get(url).await
    }

    /// Adds a comment to a work item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn add_work_item_comment(
        &self,
        id: f64,
        comment: &str,
    ) -> Result<WorkItemComment, AppError> {
        let id = validate_work_item_id(id)?;
        validate_required_string(comment, "Comment", MAX_LARGE_TEXT_LENGTH)?;
        let url = self.endpoint_with_version(
            Host::Core,
            &["_apis", "wit", "workItems", &id.to_string(), "comments"],
            COMMENTS_API_VERSION,
        )?;
        self.post(url, &json!({ "text": comment })).await
    }

    /// Adds a relation from `source_id` to `target_id`.
    ///
    /// Returns the link type actually applied.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn link_work_items(
        &self,
        source_id: f64,
        target_id: f64,
        link_type: &str,
    ) -> Result<LinkType, AppError> {
        let source = validate_id(source_id, "source work item ID")?;
        let target = validate_id(target_id, "target work item ID")?;
        validate_string_input(link_type, "Link type", MAX_NAME_LENGTH)?;

        let link = LinkType::from_name(link_type);
        let target_url = self.work_item_api_url(target)?;
        let operations = [PatchOperation::add_relation(link.reference_name(), target_url.as_str())];

        let url = self.endpoint(Host::Core, &["_apis", "wit", "workitems", &source.to_string()])?;
        let _: WorkItem = self.json_patch(Method::PATCH, url, &operations).await?;
        Ok(link)
    }

    /// Runs WIQL and returns the matching ids.
    async fn wiql(
        &self,
        project: Option<&str>,
        query: &str,
        top: Option<usize>,
    ) -> Result<Vec<u32>, AppError> {
        let mut url = match project {
            Some(project) => self.endpoint(Host::Core, &[project, "_apis", "wit", "wiql"])?,
            None => self.endpoint(Host::Core, &["_apis", "wit", "wiql"])?,
        };
        if let Some(top) = top {
            url.query_pairs_mut().append_pair("$top", &top.to_string());
        }

        let result: WiqlResult = self.post(url, &json!({ "query": query })).await?;
        tracing::debug!(count = result.work_items.len(), "WIQL query matched");
        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    /// Fetches full work items for `ids`, preserving order.
    async fn fetch_work_items(&self, ids: &[u32]) -> Result<Vec<WorkItem>, AppError> {
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_SIZE) {
            let joined = chunk.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
            let mut url = self.endpoint(Host::Core, &["_apis", "wit", "workitems"])?;
            url.query_pairs_mut().append_pair("ids", &joined);
            let batch: ListResponse<WorkItem> = self.get(url).await?;
            items.extend(batch.value);
        }
        Ok(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("Related", LinkType::Related ; "related")]
    #[test_case("parent", LinkType::Parent ; "lowercase parent")]
    #[test_case("CHILD", LinkType::Child ; "uppercase child")]
    #[test_case("Predecessor", LinkType::Predecessor ; "predecessor")]
    #[test_case("Successor", LinkType::Successor ; "successor")]
    #[test_case("Duplicate", LinkType::Related ; "unknown falls back")]
    fn test_link_type_from_name(name: &str, expected: LinkType) {
        assert_eq!(LinkType::from_name(name), expected);
    }

    #[test]
    fn test_link_type_reference_names() {
        assert_eq!(LinkType::Parent.reference_name(), "System.LinkTypes.Hierarchy-Reverse");
        assert_eq!(LinkType::Child.reference_name(), "System.LinkTypes.Hierarchy-Forward");
        assert_eq!(LinkType::Successor.to_string(), "Successor");
    }

    #[test]
    fn test_update_operations_skip_empty() {
        let update = WorkItemUpdate {
            title: Some("New title".into()),
            description: Some(String::new()),
            state: None,
            assigned_to: Some("ada@contoso.com".into()),
        };
        let ops = update.to_operations();
        let paths: Vec<&str> = ops.iter().map(|op| op.path.as_str()).collect();
        assert_eq!(paths, vec!["/fields/System.Title", "/fields/System.AssignedTo"]);
        assert!(ops.iter().all(|op| op.op == "replace"));
    }

    #[test]
    fn test_update_empty() {
        assert!(WorkItemUpdate::default().to_operations().is_empty());
    }

    #[test]
    fn test_update_validate_title_length() {
        let update = WorkItemUpdate {
            title: Some("t".repeat(256)),
            ..WorkItemUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_creation_operations_maps_short_names() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "priority": 1,
            "title": "Login fails",
            "Microsoft.VSTS.Scheduling.StoryPoints": 3,
            "tags": "auth; web"
        }))
        .unwrap();

        let ops = creation_operations(&fields).unwrap();
        assert_eq!(ops[0].path, "/fields/System.Title");
        let paths: Vec<&str> = ops.iter().map(|op| op.path.as_str()).collect();
        assert!(paths.contains(&"/fields/Microsoft.VSTS.Common.Priority"));
        assert!(paths.contains(&"/fields/Microsoft.VSTS.Scheduling.StoryPoints"));
        assert!(paths.contains(&"/fields/System.Tags"));
        assert!(ops.iter().all(|op| op.op == "add"));
    }

    #[test]
    fn test_creation_operations_requires_title() {
        let fields: Map<String, Value> =
            serde_json::from_value(json!({ "description": "no title" })).unwrap();
        let err = creation_operations(&fields).unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_creation_operations_rejects_unknown_short_name() {
        let fields: Map<String, Value> =
            serde_json::from_value(json!({ "title": "x", "colour": "red" })).unwrap();
        assert!(matches!(
            creation_operations(&fields),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_creation_operations_accepts_full_title_name() {
        let fields: Map<String, Value> =
            serde_json::from_value(json!({ "System.Title": "Direct" })).unwrap();
        let ops = creation_operations(&fields).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].value, json!("Direct"));
    }

    #[test]
    fn test_creation_operations_rejects_structured_values() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "title": "t",
            "description": ["x".repeat(100_000)]
        }))
        .unwrap();
        assert!(matches!(
            creation_operations(&fields),
            Err(ValidationError::InvalidFormat { .. })
        ));

        let fields: Map<String, Value> = serde_json::from_value(json!({
            "title": "t",
            "Custom.Blob": { "nested": "x".repeat(100_000) }
        }))
        .unwrap();
        assert!(creation_operations(&fields).is_err());
    }

    #[test]
    fn test_creation_operations_field_types() {
        let ok: Map<String, Value> = serde_json::from_value(json!({
            "title": "t",
            "priority": 2,
            "Custom.Blocked": true,
            "Custom.Notes": "free text"
        }))
        .unwrap();
        assert_eq!(creation_operations(&ok).unwrap().len(), 4);

        for bad in [
            json!({ "title": 5 }),
            json!({ "title": "t", "state": 1 }),
            json!({ "title": "t", "priority": "high" }),
            json!({ "title": "t", "priority": true }),
        ] {
            let fields: Map<String, Value> = serde_json::from_value(bad).unwrap();
            assert!(creation_operations(&fields).is_err());
        }
    }

    #[test]
    fn test_creation_operations_bounds_text_fields() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "title": "t",
            "Custom.Notes": "x".repeat(MAX_LARGE_TEXT_LENGTH + 1)
        }))
        .unwrap();
        assert!(matches!(
            creation_operations(&fields),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
