//! Publishing error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::github::GitHubApiError;

/// The stage of the publish pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    BaseRef,
    Blobs,
    Tree,
    Commit,
    Ref,
    PullRequest,
}

impl PublishStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStep::BaseRef => "base_ref",
            PublishStep::Blobs => "blobs",
            PublishStep::Tree => "tree",
            PublishStep::Commit => "commit",
            PublishStep::Ref => "ref",
            PublishStep::PullRequest => "pull_request",
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A publish failure, naming the step that failed.
///
/// Objects created by earlier steps are left in place; unreferenced objects
/// are garbage collected by the host.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A GitHub call failed.
    #[error("{step} step failed: {source}")]
    Api {
        step: PublishStep,
        #[source]
        source: GitHubApiError,
    },

    /// None of the candidate base branches exist.
    #[error("base_ref step failed: none of the branches {} exist", .tried.join(", "))]
    NoBaseBranch { tried: Vec<String> },

    /// The interpreter answered with a response for a different effect.
    #[error("{step} step failed: unexpected response")]
    UnexpectedResponse { step: PublishStep },
}

impl PublishError {
    pub fn step(&self) -> PublishStep {
        match self {
            PublishError::Api { step, .. } | PublishError::UnexpectedResponse { step } => *step,
            PublishError::NoBaseBranch { .. } => PublishStep::BaseRef,
        }
    }
}
