//! GitHub API client and effect interpreter.
//!
//! This module provides the implementation for executing GitHub effects via the octocrab
//! library. It implements the `GitHubInterpreter` and `GitHubConnector` traits
//! defined in the effects module.
//!
//! Key features:
//! - Every call is bounded by the configured request timeout
//! - Errors are classified so callers can tell "absent" and "already exists"
//!   apart from real failures

mod client;
mod error;
mod interpreter;

pub use client::{OctocrabClient, OctocrabConnector};
pub use error::{GitHubApiError, GitHubErrorKind, classify, is_reference_exists_message};
pub use interpreter::{encode_path, interpret_github_effect};
