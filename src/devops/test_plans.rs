//! Test plan, suite, case and result operations.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;

use super::client::DevOpsClient;
use super::config::Host;
use super::types::{
    ListResponse, PatchOperation, SuiteTestCase, TestCaseResult, TestPlan, TestPoint, TestRun,
    TestSuite, WorkItem,
};
use crate::error::{ApiError, AppError, ValidationError};
use crate::validation::{
    escape_xml, validate_id, validate_optional_string, validate_project_name,
    validate_required_string, DEFAULT_MAX_STRING_LENGTH, MAX_LARGE_TEXT_LENGTH, MAX_NAME_LENGTH,
    MAX_TITLE_LENGTH,
};

const TEST_RESULTS_API_VERSION: &str = "7.0-preview.1";

/// Result id the service assigns to the first result of a new run.
const FIRST_RESULT_ID: u32 = 100_000;

/// Priority applied to new test cases when none is given.
pub const DEFAULT_TEST_CASE_PRIORITY: u8 = 2;

/// Accepted suite types.
pub const SUITE_TYPES: [&str; 3] = ["StaticTestSuite", "DynamicTestSuite", "RequirementTestSuite"];

/// Test outcome recorded by [`DevOpsClient::run_test_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Blocked.
    Blocked,
    /// Not applicable.
    NotApplicable,
    /// No outcome.
    None,
}

impl TestOutcome {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Blocked => "Blocked",
            Self::NotApplicable => "NotApplicable",
            Self::None => "None",
        }
    }
}

impl FromStr for TestOutcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "blocked" => Ok(Self::Blocked),
            "notapplicable" => Ok(Self::NotApplicable),
            "none" => Ok(Self::None),
            _ => Err(ValidationError::InvalidFormat {
                field: "test outcome".to_string(),
                reason: "must be one of Passed, Failed, Blocked, NotApplicable, None".to_string(),
            }),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test case to create.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewTestCase<'a> {
    /// Title.
    pub title: &'a str,
    /// Step actions, one per line.
    pub steps: Option<&'a str>,
    /// Expected result, attached to the last step.
    pub expected_result: Option<&'a str>,
    /// Priority 1 (highest) to 4.
    pub priority: Option<f64>,
}

/// Validates a test case priority, defaulting to
/// [`DEFAULT_TEST_CASE_PRIORITY`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFormat`] unless the value is an
/// integer from 1 to 4.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn validate_priority(priority: Option<f64>) -> Result<u8, ValidationError> {
    match priority {
        None => Ok(DEFAULT_TEST_CASE_PRIORITY),
        Some(p) if p.fract() == 0.0 && (1.0..=4.0).contains(&p) => Ok(p as u8),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "priority".to_string(),
            reason: "must be an integer from 1 to 4".to_string(),
        }),
    }
}

/// Renders step text into the `Microsoft.VSTS.TCM.Steps` XML document.
///
/// Each non-blank line becomes one step; the expected result goes on the
/// last step. Returns `None` when there are no steps.
#[must_use]
pub fn steps_xml(steps: &str, expected_result: Option<&str>) -> Option<String> {
    let actions: Vec<&str> = steps.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if actions.is_empty() {
        return None;
    }

    let last = actions.len();
    let mut xml = format!(r#"<steps id="0" last="{}">"#, last + 1);
    for (i, action) in actions.iter().enumerate() {
        let id = i + 2;
        let expected = if i + 1 == last {
            expected_result.map(escape_xml).unwrap_or_default()
        } else {
            String::new()
        };
        let kind = if expected.is_empty() { "ActionStep" } else { "ValidateStep" };
        xml.push_str(&format!(
            r#"<step id="{id}" type="{kind}"><parameterizedString isformatted="true">{}</parameterizedString><parameterizedString isformatted="true">{expected}</parameterizedString><description/></step>"#,
            escape_xml(action)
        ));
    }
    xml.push_str("</steps>");
    Some(xml)
}

fn validate_suite_type(suite_type: &str) -> Result<(), ValidationError> {
    if SUITE_TYPES.contains(&suite_type) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "suite type".to_string(),
            reason: format!("must be one of {}", SUITE_TYPES.join(", ")),
        })
    }
}

impl DevOpsClient {
    /// Creates a test plan.
    ///
    /// The area defaults to the project root and the iteration to
    /// `{project}\Iteration 1`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_test_plan(
        &self,
        project: &str,
        name: &str,
        area_path: Option<&str>,
        iteration: Option<&str>,
    ) -> Result<TestPlan, AppError> {
        validate_project_name(project)?;
        validate_required_string(name, "Test plan name", MAX_NAME_LENGTH)?;
        validate_optional_string(area_path, "Area path", DEFAULT_MAX_STRING_LENGTH)?;
        validate_optional_string(iteration, "Iteration", DEFAULT_MAX_STRING_LENGTH)?;

        let area = area_path.filter(|a| !a.is_empty()).unwrap_or(project);
        let iteration = iteration
            .filter(|i| !i.is_empty())
            .map_or_else(|| format!("{project}\\Iteration 1"), str::to_string);

        let url = self.endpoint(Host::Core, &[project, "_apis", "test", "plans"])?;
        let body = json!({ "name": name, "area": { "name": area }, "iteration": iteration });
        self.post(url, &body).await
    }

    /// Lists test plans, optionally keeping only active or inactive ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_test_plans(
        &self,
        project: &str,
        is_active: Option<bool>,
    ) -> Result<Vec<TestPlan>, AppError> {
        validate_project_name(project)?;
        let url = self.endpoint(Host::Core, &[project, "_apis", "test", "plans"])?;
        let list: ListResponse<TestPlan> = self.get(url).await?;

        let plans = match is_active {
            None => list.value,
            Some(active) => {
                let wanted = if active { "Active" } else { "Inactive" };
                list.value
                    .into_iter()
                    .filter(|p| p.state.as_deref() == Some(wanted))
                    .collect()
            }
        };
        Ok(plans)
    }

    /// Creates a suite in a plan. The type defaults to `StaticTestSuite`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_test_suite(
        &self,
        project: &str,
        plan_id: f64,
        name: &str,
        suite_type: Option<&str>,
    ) -> Result<TestSuite, AppError> {
        validate_project_name(project)?;
        let plan = validate_id(plan_id, "test plan ID")?;
        validate_required_string(name, "Test suite name", MAX_NAME_LENGTH)?;
        let suite_type = suite_type.filter(|t| !t.is_empty()).unwrap_or(SUITE_TYPES[0]);
        validate_suite_type(suite_type)?;

        let url = self.endpoint(
            Host::Core,
            &[project, "_apis", "test", "Plans", &plan.to_string(), "suites"],
        )?;
        self.post(url, &json!({ "suiteType": suite_type, "name": name })).await
    }

    /// Creates a `Test Case` work item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn create_test_case(
        &self,
        project: &str,
        test_case: NewTestCase<'_>,
    ) -> Result<WorkItem, AppError> {
        validate_project_name(project)?;
        validate_required_string(test_case.title, "Title", MAX_TITLE_LENGTH)?;
        validate_optional_string(test_case.steps, "Steps", MAX_LARGE_TEXT_LENGTH)?;
        validate_optional_string(test_case.expected_result, "Expected result", MAX_LARGE_TEXT_LENGTH)?;
        let priority = validate_priority(test_case.priority)?;

        let mut operations = vec![
            PatchOperation::add_field("System.Title", test_case.title),
            PatchOperation::add_field("Microsoft.VSTS.Common.Priority", priority),
        ];
        if let Some(xml) = test_case
            .steps
            .and_then(|steps| steps_xml(steps, test_case.expected_result))
        {
            operations.push(PatchOperation::add_field("Microsoft.VSTS.TCM.Steps", xml));
        }

        let url = self.endpoint(Host::Core, &[project, "_apis", "wit", "workitems", "$Test Case"])?;
        self.json_patch(Method::POST, url, &operations).await
    }

    /// Adds existing test cases to a suite.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn add_test_cases_to_suite(
        &self,
        project: &str,
        plan_id: f64,
        suite_id: f64,
        test_case_ids: &[f64],
    ) -> Result<Vec<SuiteTestCase>, AppError> {
        validate_project_name(project)?;
        let plan = validate_id(plan_id, "test plan ID")?;
        let suite = validate_id(suite_id, "test suite ID")?;
        if test_case_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "Test case IDs".to_string(),
            }
            .into());
        }
        let ids = test_case_ids
            .iter()
            .map(|&id| validate_id(id, "test case ID").map(|id| id.to_string()))
            .collect::<Result<Vec<_>, _>>()?
            .join(",");

        let url = self.endpoint(
            Host::Core,
            &[
                project,
                "_apis",
                "test",
                "Plans",
                &plan.to_string(),
                "suites",
                &suite.to_string(),
                "testcases",
                &ids,
            ],
        )?;
        let added: ListResponse<SuiteTestCase> = self.post_empty(url).await?;
        Ok(added.value)
    }

    /// Lists the test cases in a suite.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn list_test_cases(
        &self,
        project: &str,
        plan_id: f64,
        suite_id: f64,
    ) -> Result<Vec<SuiteTestCase>, AppError> {
        validate_project_name(project)?;
        let plan = validate_id(plan_id, "test plan ID")?;
        let suite = validate_id(suite_id, "test suite ID")?;

        let url = self.endpoint(
            Host::Core,
            &[
                project,
                "_apis",
                "test",
                "Plans",
                &plan.to_string(),
                "suites",
                &suite.to_string(),
                "testcases",
            ],
        )?;
        let list: ListResponse<SuiteTestCase> = self.get(url).await?;
        Ok(list.value)
    }

    /// Records a manual execution of one test case.
    ///
    /// Looks up the case's test point in the suite, opens a run on it and
    /// completes the run's single result with `outcome`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, a missing test point, rate
    /// limiting or API failure.
    pub async fn run_test_case(
        &self,
        project: &str,
        ids: TestCaseRef,
        outcome: &str,
        comment: Option<&str>,
    ) -> Result<(TestRun, TestOutcome), AppError> {
        validate_project_name(project)?;
        let plan = validate_id(ids.plan_id, "test plan ID")?;
        let suite = validate_id(ids.suite_id, "test suite ID")?;
        let test_case = validate_id(ids.test_case_id, "test case ID")?;
        let outcome: TestOutcome = outcome.parse()?;
        validate_optional_string(comment, "Comment", MAX_LARGE_TEXT_LENGTH)?;

        let mut points_url = self.endpoint(
            Host::Core,
            &[
                project,
                "_apis",
                "test",
                "Plans",
                &plan.to_string(),
                "Suites",
                &suite.to_string(),
                "points",
            ],
        )?;
        points_url
            .query_pairs_mut()
            .append_pair("testCaseId", &test_case.to_string());
        let points: ListResponse<TestPoint> = self.get(points_url).await?;
        let point = points.value.first().ok_or_else(|| ApiError::UnexpectedResponse {
            message: format!("test case {test_case} has no test point in suite {suite}"),
        })?;

        let run_url = self.endpoint(Host::Core, &[project, "_apis", "test", "runs"])?;
        let run_body = json!({
            "name": format!("Test Run - {}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            "plan": { "id": plan },
            "pointIds": [point.id],
        });
        let run: TestRun = self.post(run_url, &run_body).await?;

        let results_url = self.endpoint(
            Host::Core,
            &[project, "_apis", "test", "runs", &run.id.to_string(), "results"],
        )?;
        let results_body = json!([{
            "id": FIRST_RESULT_ID,
            "outcome": outcome.as_str(),
            "comment": comment.unwrap_or_default(),
            "state": "Completed",
        }]);
        let _: ListResponse<TestCaseResult> = self.patch(results_url, &results_body).await?;

        tracing::info!(run_id = run.id, test_case, outcome = %outcome, "Test case result recorded");
        Ok((run, outcome))
    }

    /// Lists the results of a test run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_test_results(
        &self,
        project: &str,
        run_id: f64,
    ) -> Result<Vec<TestCaseResult>, AppError> {
        validate_project_name(project)?;
        let run = validate_id(run_id, "test run ID")?;
        let url = self.endpoint(
            Host::Core,
            &[project, "_apis", "test", "runs", &run.to_string(), "results"],
        )?;
        let list: ListResponse<TestCaseResult> = self.get(url).await?;
        Ok(list.value)
    }

    /// Lists every test result produced by a build.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] on invalid input, rate limiting or API failure.
    pub async fn get_test_results_by_build(
        &self,
        project: &str,
        build_id: f64,
    ) -> Result<Vec<TestCaseResult>, AppError> {
        validate_project_name(project)?;
        let build = validate_id(build_id, "build ID")?;
        let mut url = self.endpoint_with_version(
            Host::TestResults,
            &[project, "_apis", "testresults", "resultsbybuild"],
            TEST_RESULTS_API_VERSION,
        )?;
        url.query_pairs_mut().append_pair("buildId", &build.to_string());
        let list: ListResponse<TestCaseResult> = self.get(url).await?;
        Ok(list.value)
    }
}

/// Identifies a test case within a plan and suite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestCaseRef {
    /// Test plan id.
    pub plan_id: f64,
    /// Test suite id.
    pub suite_id: f64,
    /// Test case work item id.
    pub test_case_id: f64,
}
