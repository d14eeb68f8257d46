//! GitHub webhook payload parser.
//!
//! This module parses raw webhook JSON payloads into typed [`GitHubEvent`] values.
//! The parser is designed to be robust against unknown fields and event types.
//!
//! # Parsing Strategy
//!
//! 1. The event type is determined from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types return `Ok(None)` (ignored, not error)
//! 4. Malformed payloads return `Err` with details

use serde::Deserialize;
use thiserror::Error;

use crate::types::{InstallationId, IssueNumber, RepoId};

use super::events::{CommentAction, GitHubEvent, IssueCommentEvent, IssueDetails};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// # Returns
///
/// * `Ok(Some(event))` - Successfully parsed a known event type
/// * `Ok(None)` - Unknown event type (ignored, not an error)
/// * `Err(e)` - Malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use issue_autopatch::webhooks::{parse_webhook, GitHubEvent};
///
/// let payload = br#"{
///     "action": "created",
///     "comment": {
///         "id": 123,
///         "body": "@bot fix src/lib.rs",
///         "user": { "login": "octocat", "type": "User" }
///     },
///     "issue": { "number": 42, "title": "Crash", "body": null },
///     "repository": { "owner": { "login": "owner" }, "name": "repo" }
/// }"#;
///
/// let event = parse_webhook("issue_comment", payload).unwrap();
/// assert!(matches!(event, Some(GitHubEvent::IssueComment(_))));
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(GitHubEvent::IssueComment(e))),
        "ping" => Ok(Some(GitHubEvent::Ping)),
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
    installation: Option<RawInstallation>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: Option<String>,
    body: Option<String>,
    // If this field is present, the issue is actually a PR
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => CommentAction::Created,
        "edited" => CommentAction::Edited,
        "deleted" => CommentAction::Deleted,
        _ => CommentAction::Other,
    };

    Ok(IssueCommentEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        default_branch: raw.repository.default_branch,
        action,
        issue: IssueDetails {
            number: IssueNumber(raw.issue.number),
            title: raw.issue.title.unwrap_or_default(),
            body: raw.issue.body.unwrap_or_default(),
            is_pull_request: raw.issue.pull_request.is_some(),
        },
        comment_id: raw.comment.id,
        body: raw.comment.body.unwrap_or_default(),
        author_is_bot: raw.comment.user.kind.as_deref() == Some("Bot"),
        author_login: raw.comment.user.login,
        installation_id: raw.installation.map(|i| InstallationId(i.id)),
    })
}
