//! GitHub API error types.
//!
//! Errors are classified by what the caller can do about them rather than by
//! transport detail:
//!
//! - **NotFound** (HTTP 404) is an expected answer for optional content such
//!   as a missing standards document or a requested file that doesn't exist
//! - **AlreadyExists** (HTTP 422 "Reference already exists") is tolerated when
//!   re-creating a fix branch for an issue that was handled before
//! - **PullRequestExists** (HTTP 422 "A pull request already exists") is
//!   answered by looking up the open pull request for that branch
//! - **Unauthorized** (HTTP 401/403) means the credential was rejected
//! - everything else is fatal for the current delivery

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// HTTP 404.
    NotFound,

    /// HTTP 422 with "Reference already exists".
    AlreadyExists,

    /// HTTP 422 with "A pull request already exists".
    PullRequestExists,

    /// HTTP 401, or a 403 that isn't a rate limit.
    Unauthorized,

    /// The call did not complete within the configured request timeout.
    Timeout,

    /// Connection, TLS or DNS failure before a response arrived.
    Transport,

    /// Any other failure.
    Other,
}

/// A GitHub API error with its classification.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    fn without_source(
        kind: GitHubErrorKind,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status_code,
            message: message.into(),
            source: None,
        }
    }

    /// A 404 without an octocrab source.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::NotFound, Some(404), message)
    }

    /// A 422 "Reference already exists" without an octocrab source.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::AlreadyExists, Some(422), message)
    }

    /// A 422 "A pull request already exists" without an octocrab source.
    pub fn pull_request_exists(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::PullRequestExists, Some(422), message)
    }

    /// A 401 without an octocrab source.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::Unauthorized, Some(401), message)
    }

    /// A request that exceeded its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::Timeout, None, message)
    }

    /// An unclassified failure without an octocrab source.
    pub fn other(message: impl Into<String>) -> Self {
        Self::without_source(GitHubErrorKind::Other, None, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == GitHubErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == GitHubErrorKind::AlreadyExists
    }

    pub fn is_pull_request_exists(&self) -> bool {
        self.kind == GitHubErrorKind::PullRequestExists
    }

    /// Classifies an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = Self::extract_status_code(&err);
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => {
                validation_message(&source.message, source.errors.as_deref())
            }
            other => other.to_string(),
        };
        let kind = classify(status_code, &message);

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Extracts the HTTP status code from an octocrab error, if present.
    ///
    /// API errors carry the status directly. For the remaining variants we
    /// fall back to scanning the rendered message, which is fragile but only
    /// ever narrows an error down from `Other`.
    fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
        if let octocrab::Error::GitHub { source, .. } = err {
            return Some(source.status_code.as_u16());
        }

        let err_str = err.to_string();
        if let Some(idx) = err_str.find("status: ") {
            let digits: String = err_str[idx + 8..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(code) = digits.parse() {
                return Some(code);
            }
        }
        if err_str.contains("404") && err_str.to_lowercase().contains("not found") {
            return Some(404);
        }
        None
    }
}

/// Joins a top-level API message with the `message` fields of its `errors`
/// array. GitHub reports some 422 causes only in the array, under a generic
/// "Validation Failed".
pub fn validation_message(message: &str, errors: Option<&[serde_json::Value]>) -> String {
    let details: Vec<&str> = errors
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e.get("message").and_then(serde_json::Value::as_str))
        .collect();
    if details.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", message, details.join("; "))
    }
}

/// Maps a status code and message to an error kind.
///
/// This is a pure function extracted for testability.
pub fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(404) => GitHubErrorKind::NotFound,
        Some(422) if is_reference_exists_message(message) => GitHubErrorKind::AlreadyExists,
        Some(422) if is_pull_request_exists_message(message) => {
            GitHubErrorKind::PullRequestExists
        }
        Some(401) => GitHubErrorKind::Unauthorized,
        Some(403) if !is_rate_limit_error(message) => GitHubErrorKind::Unauthorized,
        Some(_) => GitHubErrorKind::Other,
        None if is_network_error(message) => GitHubErrorKind::Transport,
        None => GitHubErrorKind::Other,
    }
}

/// Checks if an error message is GitHub's answer to creating a ref twice.
pub fn is_reference_exists_message(message: &str) -> bool {
    message.to_lowercase().contains("reference already exists")
}

/// Checks if an error message is GitHub's answer to opening a second pull
/// request from the same head.
pub fn is_pull_request_exists_message(message: &str) -> bool {
    message.to_lowercase().contains("a pull request already exists")
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}
