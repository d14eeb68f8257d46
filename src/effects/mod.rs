//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Pure pipeline stages that name the call they need as data
//! - Testability via recording interpreters
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{
    GitHubEffect, GitHubResponse, PullRequestRef, RawFileContent, REGULAR_FILE_MODE, TreeEntry,
};
pub use interpreter::{GitHubConnector, GitHubInterpreter};
