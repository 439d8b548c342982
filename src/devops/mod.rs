//! Azure DevOps REST API client.
//!
//! This module provides:
//! - [`DevOpsClient`]: authenticated, rate-limited HTTP client
//! - [`ClientConfig`]: per-organization host configuration
//! - Typed request and response models
//! - One submodule of operations per API area
//!
//! Every operation validates its input first, so a rejected call never
//! reaches the rate limiter or the network.

mod builds;
mod client;
mod config;
mod projects;
mod releases;
mod repos;
mod search;
mod test_plans;
pub mod types;
mod wikis;
mod work;
mod work_items;

pub use client::DevOpsClient;
pub use config::{
    ClientConfig, Host, DEFAULT_API_VERSION, DEFAULT_HOST, DEFAULT_TIMEOUT_MS, RELEASE_HOST,
    SEARCH_HOST, TEST_RESULTS_HOST,
};
pub use repos::{NewPullRequest, PullRequestStatus};
pub use search::{CODE_SEARCH_TOP, WORK_ITEM_SEARCH_TOP};
pub use test_plans::{
    steps_xml, validate_priority, NewTestCase, TestCaseRef, TestOutcome,
    DEFAULT_TEST_CASE_PRIORITY, SUITE_TYPES,
};
pub use work::{IterationDates, AREA_TREE_DEPTH};
pub use work_items::{LinkType, WorkItemUpdate, DEFAULT_WORK_ITEM_LIMIT};
