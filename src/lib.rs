//! Azure DevOps MCP Server
//!
//! An MCP server exposing an Azure DevOps organization's work items,
//! repositories, pull requests, builds, test plans, releases, wikis,
//! iterations and areas as tools.
//!
//! # Features
//!
//! - 51 tools over the Azure DevOps REST API
//! - Personal access token authentication
//! - Input validation and WIQL escaping before any network call
//! - Fixed-window rate limiting of outbound requests (100 per minute)
//!
//! # Quick Start
//!
//! ```bash
//! AZURE_DEVOPS_PAT=xxxx ./azure-devops-mcp contoso
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     stdin      ┌─────────────────┐   HTTPS   ┌──────────────┐
//! │ MCP client  │───────────────▶│   MCP Server    │──────────▶│ Azure DevOps │
//! │             │◀───────────────│     (Rust)      │           │   REST API   │
//! └─────────────┘     stdout     └─────────────────┘           └──────────────┘
//!                                 validate → rate limit → request
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod devops;
pub mod error;
pub mod rate_limit;
pub mod server;
pub mod traits;
pub mod validation;
