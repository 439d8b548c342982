//! Azure DevOps REST API types.
//!
//! Only the fields the tools read or write are modelled; everything else
//! in the responses is ignored during deserialization.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Shared
// ============================================================================

/// The `{ "count": n, "value": [...] }` envelope used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// A user or group.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: String,
    pub unique_name: Option<String>,
}

/// Any resource that is referenced by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: Option<Value>,
    #[serde(default)]
    pub name: String,
}

/// Hyperlinks attached to a resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    pub web: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// An identifier that some endpoints send as a number and others as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(u64),
    Text(String),
}

impl fmt::Display for FlexibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProject {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub state: Option<String>,
    pub url: Option<String>,
    pub visibility: Option<String>,
}

// ============================================================================
// Work items
// ============================================================================

/// A work item with its field bag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u32,
    pub rev: Option<u32>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub url: Option<String>,
}

impl WorkItem {
    /// Returns a string field by reference name.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns an identity field's display name (e.g. `System.AssignedTo`).
    #[must_use]
    pub fn identity_name(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            Value::Object(identity) => identity.get("displayName").and_then(Value::as_str),
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a date field, if present and RFC 3339.
    #[must_use]
    pub fn date_field(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field_str(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.field_str("System.Title").unwrap_or_default()
    }

    #[must_use]
    pub fn state(&self) -> &str {
        self.field_str("System.State").unwrap_or_default()
    }

    #[must_use]
    pub fn work_item_type(&self) -> &str {
        self.field_str("System.WorkItemType").unwrap_or_default()
    }

    #[must_use]
    pub fn assigned_to(&self) -> Option<&str> {
        self.identity_name("System.AssignedTo")
    }
}

/// Result of a WIQL query: ids only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorkItemReference {
    pub id: u32,
}

/// One JSON Patch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: &'static str,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    /// `add` on a field, by reference name.
    #[must_use]
    pub fn add_field(field: &str, value: impl Into<Value>) -> Self {
        Self {
            op: "add",
            path: format!("/fields/{field}"),
            value: value.into(),
        }
    }

    /// `replace` on a field, by reference name.
    #[must_use]
    pub fn replace_field(field: &str, value: impl Into<Value>) -> Self {
        Self {
            op: "replace",
            path: format!("/fields/{field}"),
            value: value.into(),
        }
    }

    /// `add` of a relation.
    #[must_use]
    pub fn add_relation(rel: &str, url: &str) -> Self {
        Self {
            op: "add",
            path: "/relations/-".to_string(),
            value: serde_json::json!({ "rel": rel, "url": url }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<WorkItemComment>,
    pub total_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemComment {
    pub id: u32,
    #[serde(default)]
    pub text: String,
    pub created_by: Option<IdentityRef>,
    pub created_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A work item search hit. Field keys are lower-case reference names.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemSearchResult {
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub project: NamedRef,
}

impl WorkItemSearchResult {
    /// Returns a field as display text, whatever its JSON type.
    #[must_use]
    pub fn field_text(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSearchResult {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub project: NamedRef,
    #[serde(default)]
    pub repository: NamedRef,
    #[serde(default)]
    pub matches: HashMap<String, Vec<Value>>,
}

impl CodeSearchResult {
    /// Total hits across content, file name and path matches.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Git
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    pub id: String,
    pub name: String,
    pub default_branch: Option<String>,
    pub web_url: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPullRequest {
    pub pull_request_id: u32,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    pub created_by: Option<IdentityRef>,
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_ref_name: String,
    #[serde(default)]
    pub target_ref_name: String,
    #[serde(default)]
    pub reviewers: Vec<IdentityRef>,
    pub repository: Option<NamedRef>,
    pub url: Option<String>,
    pub last_merge_source_commit: Option<GitCommitRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    pub commit_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    pub name: String,
    #[serde(default)]
    pub object_id: String,
    pub creator: Option<IdentityRef>,
}

impl GitRef {
    /// The ref name without its `refs/heads/` prefix.
    #[must_use]
    pub fn branch_name(&self) -> &str {
        self.name.strip_prefix("refs/heads/").unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: u32,
    pub status: Option<String>,
    #[serde(default)]
    pub comments: Vec<PullRequestComment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestComment {
    pub id: u32,
    pub content: Option<String>,
    pub author: Option<IdentityRef>,
}

// ============================================================================
// Builds
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: u32,
    pub build_number: Option<String>,
    #[serde(default)]
    pub definition: NamedRef,
    pub status: Option<String>,
    pub result: Option<String>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub requested_by: Option<IdentityRef>,
    pub source_branch: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinitionReference {
    pub id: u32,
    pub name: String,
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// ============================================================================
// Test plans
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub id: u32,
    pub name: String,
    pub state: Option<String>,
    pub iteration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub id: u32,
    pub name: String,
    pub suite_type: Option<String>,
}

/// A test case entry in a suite.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteTestCase {
    pub test_case: SuiteTestCaseRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteTestCaseRef {
    pub id: FlexibleId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestPoint {
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: u32,
    pub name: Option<String>,
    pub state: Option<String>,
    pub web_access_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: u32,
    pub test_case: Option<NamedRef>,
    pub test_case_title: Option<String>,
    pub outcome: Option<String>,
    pub duration_in_ms: Option<f64>,
    pub error_message: Option<String>,
}

impl TestCaseResult {
    /// The test case name from whichever field the endpoint filled in.
    #[must_use]
    pub fn title(&self) -> &str {
        self.test_case_title
            .as_deref()
            .or_else(|| self.test_case.as_ref().map(|tc| tc.name.as_str()))
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Outcome counts over a set of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestOutcomeSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub other: usize,
}

impl TestOutcomeSummary {
    #[must_use]
    pub fn from_results(results: &[TestCaseResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.outcome.as_deref() {
                Some("Passed") => acc.passed += 1,
                Some("Failed") => acc.failed += 1,
                _ => acc.other += 1,
            }
            acc
        })
    }
}

// ============================================================================
// Releases
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDefinition {
    pub id: u32,
    pub name: String,
    pub path: Option<String>,
    pub release_name_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: u32,
    pub name: String,
    pub status: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub release_definition: Option<NamedRef>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEnvironment {
    pub id: u32,
    pub name: Option<String>,
    pub status: Option<String>,
}

// ============================================================================
// Wikis
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wiki {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPage {
    pub id: Option<u32>,
    #[serde(default)]
    pub path: String,
    pub git_item_path: Option<String>,
    pub content: Option<String>,
}

/// A wiki page together with the `ETag` needed to update it.
#[derive(Debug, Clone)]
pub struct VersionedWikiPage {
    pub page: WikiPage,
    pub etag: Option<String>,
}

// ============================================================================
// Iterations and areas
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIteration {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub attributes: Option<IterationAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationAttributes {
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub time_frame: Option<String>,
}

/// A node in the area or iteration tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationNode {
    pub id: u32,
    pub name: String,
    pub path: Option<String>,
    pub attributes: Option<IterationAttributes>,
    #[serde(default)]
    pub children: Vec<ClassificationNode>,
}

impl ClassificationNode {
    /// Flattens the tree depth-first into `(id, backslash-joined path)` pairs.
    #[must_use]
    pub fn flatten(&self) -> Vec<(u32, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(u32, String)>) {
        let path = format!("{prefix}{}", self.name);
        out.push((self.id, path.clone()));
        let child_prefix = format!("{path}\\");
        for child in &self.children {
            child.flatten_into(&child_prefix, out);
        }
    }
}
