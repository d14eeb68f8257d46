//! Context gathering error types.

use thiserror::Error;

use crate::github::GitHubApiError;

/// Errors that abort context gathering.
///
/// A missing standards document or a missing target file is not an error;
/// those are reported as absent.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Reading a path failed for a reason other than "not found".
    #[error("failed to read {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: GitHubApiError,
    },

    /// The content could not be decoded to UTF-8 text.
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected response to {effect}")]
    UnexpectedResponse { effect: &'static str },
}
