//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab interpreter in `crate::github` executes them; tests use
//! recording fakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{InstallationId, Sha};

/// The file mode GitHub expects for a regular (non-executable) file.
pub const REGULAR_FILE_MODE: &str = "100644";

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed with a `RepoId`
/// and a bearer credential, so effects don't include either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── App Authentication (assertion-authenticated) ─────────────────────────
    /// Look up the App installation for the scoped repository.
    GetRepoInstallation,

    /// Exchange the assertion for an installation access token.
    CreateInstallationToken { installation_id: InstallationId },

    // ─── Contents ─────────────────────────────────────────────────────────────
    /// Read a file's contents at a ref.
    GetFileContent { path: String, git_ref: String },

    // ─── Git Database ─────────────────────────────────────────────────────────
    /// Read the commit a branch points at.
    GetRef { branch: String },

    /// Create a blob holding UTF-8 content.
    CreateBlob { content: String },

    /// Create a tree overlaying `entries` on `base_tree`.
    CreateTree {
        base_tree: Sha,
        entries: Vec<TreeEntry>,
    },

    /// Create a commit object.
    CreateCommit {
        message: String,
        tree: Sha,
        parents: Vec<Sha>,
    },

    /// Create `refs/heads/{branch}` pointing at `sha`.
    CreateRef { branch: String, sha: Sha },

    // ─── Pull Requests ────────────────────────────────────────────────────────
    /// Open a pull request from `head` into `base`.
    CreatePullRequest {
        title: String,
        body: String,
        head: String,
        base: String,
    },

    /// Find the open pull request whose head is `head` in this repository.
    GetOpenPullRequest { head: String },
}

impl GitHubEffect {
    /// A short, stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetRepoInstallation => "get_repo_installation",
            GitHubEffect::CreateInstallationToken { .. } => "create_installation_token",
            GitHubEffect::GetFileContent { .. } => "get_file_content",
            GitHubEffect::GetRef { .. } => "get_ref",
            GitHubEffect::CreateBlob { .. } => "create_blob",
            GitHubEffect::CreateTree { .. } => "create_tree",
            GitHubEffect::CreateCommit { .. } => "create_commit",
            GitHubEffect::CreateRef { .. } => "create_ref",
            GitHubEffect::CreatePullRequest { .. } => "create_pull_request",
            GitHubEffect::GetOpenPullRequest { .. } => "get_open_pull_request",
        }
    }
}

/// One entry of a tree overlay.
///
/// A `sha` of `None` serializes as `null`, which tells GitHub to remove the
/// path from the base tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: Option<Sha>,
}

impl TreeEntry {
    /// An entry that points `path` at an existing blob.
    pub fn blob(path: impl Into<String>, sha: Sha) -> Self {
        TreeEntry {
            path: path.into(),
            mode: REGULAR_FILE_MODE.to_string(),
            kind: "blob".to_string(),
            sha: Some(sha),
        }
    }

    /// An entry that removes `path`.
    pub fn removal(path: impl Into<String>) -> Self {
        TreeEntry {
            path: path.into(),
            mode: REGULAR_FILE_MODE.to_string(),
            kind: "blob".to_string(),
            sha: None,
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// File content as returned by the contents API, still transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFileContent {
    pub path: String,
    pub sha: Sha,
    /// `file`, `dir`, `symlink` or `submodule`.
    pub kind: String,
    /// Usually `base64`; `none` for files too large for the contents API.
    pub encoding: Option<String>,
    pub content: Option<String>,
}

/// A pull request's number and web URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetRepoInstallation`.
    Installation { id: InstallationId },

    /// Response to `CreateInstallationToken`.
    InstallationToken {
        token: String,
        expires_at: DateTime<Utc>,
    },

    /// Response to `GetFileContent`.
    FileContent(RawFileContent),

    /// Response to `GetRef`.
    Ref { sha: Sha },

    /// Response to `CreateBlob`.
    BlobCreated { sha: Sha },

    /// Response to `CreateTree`.
    TreeCreated { sha: Sha },

    /// Response to `CreateCommit`.
    CommitCreated { sha: Sha },

    /// Response to `CreateRef`.
    RefCreated,

    /// Response to `CreatePullRequest`.
    PullRequestCreated { number: u64, url: String },

    /// Response to `GetOpenPullRequest`; `None` when no pull request is open.
    OpenPullRequest(Option<PullRequestRef>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_entry_serializes_null_sha() {
        let json = serde_json::to_value(TreeEntry::removal("old.txt")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "old.txt",
                "mode": "100644",
                "type": "blob",
                "sha": null
            })
        );
    }

    #[test]
    fn blob_entry_serializes_sha() {
        let json = serde_json::to_value(TreeEntry::blob("a.txt", Sha::new("abc"))).unwrap();
        assert_eq!(json["sha"], "abc");
        assert_eq!(json["mode"], REGULAR_FILE_MODE);
    }

    #[test]
    fn effect_names_are_distinct() {
        let effects = [
            GitHubEffect::GetRepoInstallation,
            GitHubEffect::CreateInstallationToken {
                installation_id: InstallationId(1),
            },
            GitHubEffect::GetFileContent {
                path: "a".into(),
                git_ref: "main".into(),
            },
            GitHubEffect::GetRef {
                branch: "main".into(),
            },
            GitHubEffect::CreateBlob {
                content: "x".into(),
            },
            GitHubEffect::CreateTree {
                base_tree: Sha::new("b"),
                entries: vec![],
            },
            GitHubEffect::CreateCommit {
                message: "m".into(),
                tree: Sha::new("t"),
                parents: vec![],
            },
            GitHubEffect::CreateRef {
                branch: "b".into(),
                sha: Sha::new("c"),
            },
            GitHubEffect::CreatePullRequest {
                title: "t".into(),
                body: "b".into(),
                head: "h".into(),
                base: "main".into(),
            },
            GitHubEffect::GetOpenPullRequest { head: "h".into() },
        ];
        let names: std::collections::HashSet<_> = effects.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), effects.len());
    }
}
