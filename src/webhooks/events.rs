//! GitHub webhook event types.
//!
//! Typed representations of the webhook events the agent reacts to. Only
//! `issue_comment` carries work; `ping` is acknowledged so the App's webhook
//! configuration can be checked from the GitHub UI.

use serde::{Deserialize, Serialize};

use crate::types::{InstallationId, IssueNumber, RepoId};

/// A parsed GitHub webhook event.
///
/// Unknown or irrelevant event types are represented by returning `None` from
/// the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    /// A comment was created, edited, or deleted on an issue or PR.
    IssueComment(IssueCommentEvent),

    /// GitHub's connectivity check, sent when the webhook is first configured.
    Ping,
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// Comment was created.
    Created,
    /// Comment was edited.
    Edited,
    /// Comment was deleted.
    Deleted,
    /// Any action GitHub adds later.
    Other,
}

impl CommentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentAction::Created => "created",
            CommentAction::Edited => "edited",
            CommentAction::Deleted => "deleted",
            CommentAction::Other => "other",
        }
    }
}

/// An issue comment event.
///
/// In GitHub's model, comments on the PR conversation tab are also "issue
/// comments"; `is_pull_request` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The repository.
    pub repo: RepoId,

    /// The repository's default branch, as reported in the payload.
    pub default_branch: Option<String>,

    /// The action that triggered this event.
    pub action: CommentAction,

    /// The issue the comment was posted on.
    pub issue: IssueDetails,

    /// The comment ID.
    pub comment_id: u64,

    /// The comment body text.
    pub body: String,

    /// The comment author's login name.
    pub author_login: String,

    /// Whether the author is a bot account (`user.type == "Bot"`).
    pub author_is_bot: bool,

    /// The App installation that delivered this event, if present.
    pub installation_id: Option<InstallationId>,
}

/// The issue a comment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    pub number: IssueNumber,
    pub title: String,
    pub body: String,
    /// Set when the "issue" is actually a pull request.
    pub is_pull_request: bool,
}
