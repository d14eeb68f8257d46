//! Git publishing: base ref, blobs, tree, commit, then branch and pull request.
//!
//! Each stage consumes the typed result of the one before it, so the order
//! can't be rearranged or a stage skipped:
//!
//! ```text
//! BaseRef ──▶ Blobs ──▶ Tree ──▶ Commit ──▶ ref + pull request
//! ```
//!
//! Only the last stage branches: if the fix branch already exists (a
//! re-delivered webhook for the same issue), ref creation is skipped and the
//! pull request is opened from the existing branch, or the one already open
//! from it is returned.

mod error;

pub use error::{PublishError, PublishStep};

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, PullRequestRef, TreeEntry};
use crate::patch::{ChangeKind, FileChange, PatchPlan};
use crate::types::Sha;

/// Branch names tried when nothing else is known.
pub const FALLBACK_BRANCHES: [&str; 2] = ["main", "master"];

/// The default branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRef {
    pub branch: String,
    pub sha: Sha,
}

/// Tree entries for every change, with blobs created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blobs {
    pub base: BaseRef,
    pub entries: Vec<TreeEntry>,
}

/// The new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub base: BaseRef,
    pub sha: Sha,
}

/// The new commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub base: BaseRef,
    pub sha: Sha,
}

/// The result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestResult {
    pub number: u64,
    pub url: String,
    /// The head of `branch_name`. When the branch was reused this is its
    /// existing head, not the commit created for this delivery.
    pub commit_sha: Sha,
    pub branch_name: String,
    /// The branch existed before this delivery and was left as it was.
    pub branch_reused: bool,
}

/// Orders base branch candidates: configured override, the repository's
/// reported default, then `main` and `master`. Duplicates are dropped.
pub fn branch_candidates(configured: Option<&str>, reported: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let all = [configured, reported]
        .into_iter()
        .flatten()
        .chain(FALLBACK_BRANCHES);
    for name in all {
        let name = name.trim();
        if !name.is_empty() && !candidates.iter().any(|c| c == name) {
            candidates.push(name.to_string());
        }
    }
    candidates
}

/// Step 1: resolves the first candidate branch that exists.
pub async fn resolve_base<I: GitHubInterpreter>(
    client: &I,
    candidates: &[String],
) -> Result<BaseRef, PublishError> {
    for branch in candidates {
        let effect = GitHubEffect::GetRef {
            branch: branch.clone(),
        };
        match client.interpret(effect).await {
            Ok(GitHubResponse::Ref { sha }) => {
                debug!(branch = %branch, sha = %sha.short(), "Resolved base branch");
                return Ok(BaseRef {
                    branch: branch.clone(),
                    sha,
                });
            }
            Ok(_) => {
                return Err(PublishError::UnexpectedResponse {
                    step: PublishStep::BaseRef,
                });
            }
            Err(e) if e.is_not_found() => {
                debug!(branch = %branch, "Base branch candidate not found");
            }
            Err(source) => {
                return Err(PublishError::Api {
                    step: PublishStep::BaseRef,
                    source,
                });
            }
        }
    }

    Err(PublishError::NoBaseBranch {
        tried: candidates.to_vec(),
    })
}

/// Step 2: creates a blob per added or modified file, concurrently.
/// Deletes become entries with a null SHA and create nothing.
pub async fn create_blobs<I: GitHubInterpreter>(
    client: &I,
    base: BaseRef,
    changes: &[FileChange],
) -> Result<Blobs, PublishError> {
    let entries = try_join_all(changes.iter().map(|change| entry_for(client, change))).await?;
    Ok(Blobs { base, entries })
}

async fn entry_for<I: GitHubInterpreter>(
    client: &I,
    change: &FileChange,
) -> Result<TreeEntry, PublishError> {
    let content = match &change.kind {
        ChangeKind::Add(content) | ChangeKind::Modify(content) => content,
        ChangeKind::Delete => return Ok(TreeEntry::removal(&change.path)),
    };

    let effect = GitHubEffect::CreateBlob {
        content: content.clone(),
    };
    match client.interpret(effect).await {
        Ok(GitHubResponse::BlobCreated { sha }) => Ok(TreeEntry::blob(&change.path, sha)),
        Ok(_) => Err(PublishError::UnexpectedResponse {
            step: PublishStep::Blobs,
        }),
        Err(source) => Err(PublishError::Api {
            step: PublishStep::Blobs,
            source,
        }),
    }
}

/// Step 3: overlays the entries on the base commit's tree.
///
/// The base commit SHA is passed as `base_tree`; GitHub peels it to the
/// commit's tree.
pub async fn create_tree<I: GitHubInterpreter>(
    client: &I,
    blobs: Blobs,
) -> Result<Tree, PublishError> {
    let effect = GitHubEffect::CreateTree {
        base_tree: blobs.base.sha.clone(),
        entries: blobs.entries,
    };
    match client.interpret(effect).await {
        Ok(GitHubResponse::TreeCreated { sha }) => Ok(Tree {
            base: blobs.base,
            sha,
        }),
        Ok(_) => Err(PublishError::UnexpectedResponse {
            step: PublishStep::Tree,
        }),
        Err(source) => Err(PublishError::Api {
            step: PublishStep::Tree,
            source,
        }),
    }
}

/// Step 4: commits the tree with the base commit as its only parent.
pub async fn create_commit<I: GitHubInterpreter>(
    client: &I,
    tree: Tree,
    message: String,
) -> Result<Commit, PublishError> {
    let effect = GitHubEffect::CreateCommit {
        message,
        tree: tree.sha,
        parents: vec![tree.base.sha.clone()],
    };
    match client.interpret(effect).await {
        Ok(GitHubResponse::CommitCreated { sha }) => Ok(Commit {
            base: tree.base,
            sha,
        }),
        Ok(_) => Err(PublishError::UnexpectedResponse {
            step: PublishStep::Commit,
        }),
        Err(source) => Err(PublishError::Api {
            step: PublishStep::Commit,
            source,
        }),
    }
}

/// Step 5: creates the branch and opens the pull request into the base
/// branch.
///
/// An existing branch is left untouched: the new commit stays unreferenced
/// and the result reports the branch's current head. If a pull request from
/// the branch is already open, that pull request is returned.
pub async fn open_pull_request<I: GitHubInterpreter>(
    client: &I,
    commit: Commit,
    plan: &PatchPlan,
) -> Result<PullRequestResult, PublishError> {
    let create_ref = GitHubEffect::CreateRef {
        branch: plan.branch_name.clone(),
        sha: commit.sha.clone(),
    };
    let (head_sha, branch_reused) = match client.interpret(create_ref).await {
        Ok(GitHubResponse::RefCreated) => {
            debug!(branch = %plan.branch_name, sha = %commit.sha.short(), "Created branch");
            (commit.sha, false)
        }
        Ok(_) => {
            return Err(PublishError::UnexpectedResponse {
                step: PublishStep::Ref,
            });
        }
        Err(e) if e.is_already_exists() => {
            let head = branch_head(client, &plan.branch_name).await?;
            warn!(
                branch = %plan.branch_name,
                head = %head.short(),
                orphaned_commit = %commit.sha.short(),
                "Branch already exists, opening pull request from existing branch"
            );
            (head, true)
        }
        Err(source) => {
            return Err(PublishError::Api {
                step: PublishStep::Ref,
                source,
            });
        }
    };

    let create_pr = GitHubEffect::CreatePullRequest {
        title: plan.commit_title.clone(),
        body: plan.description.clone(),
        head: plan.branch_name.clone(),
        base: commit.base.branch.clone(),
    };
    let pull_request = match client.interpret(create_pr).await {
        Ok(GitHubResponse::PullRequestCreated { number, url }) => PullRequestRef { number, url },
        Ok(_) => {
            return Err(PublishError::UnexpectedResponse {
                step: PublishStep::PullRequest,
            });
        }
        Err(e) if e.is_pull_request_exists() => {
            let existing = open_pull_request_for(client, &plan.branch_name).await?;
            match existing {
                Some(existing) => {
                    warn!(
                        branch = %plan.branch_name,
                        pr = existing.number,
                        "Pull request already open for branch, reusing it"
                    );
                    existing
                }
                None => {
                    return Err(PublishError::Api {
                        step: PublishStep::PullRequest,
                        source: e,
                    });
                }
            }
        }
        Err(source) => {
            return Err(PublishError::Api {
                step: PublishStep::PullRequest,
                source,
            });
        }
    };

    Ok(PullRequestResult {
        number: pull_request.number,
        url: pull_request.url,
        commit_sha: head_sha,
        branch_name: plan.branch_name.clone(),
        branch_reused,
    })
}

async fn branch_head<I: GitHubInterpreter>(client: &I, branch: &str) -> Result<Sha, PublishError> {
    let effect = GitHubEffect::GetRef {
        branch: branch.to_string(),
    };
    match client.interpret(effect).await {
        Ok(GitHubResponse::Ref { sha }) => Ok(sha),
        Ok(_) => Err(PublishError::UnexpectedResponse {
            step: PublishStep::Ref,
        }),
        Err(source) => Err(PublishError::Api {
            step: PublishStep::Ref,
            source,
        }),
    }
}

async fn open_pull_request_for<I: GitHubInterpreter>(
    client: &I,
    branch: &str,
) -> Result<Option<PullRequestRef>, PublishError> {
    let effect = GitHubEffect::GetOpenPullRequest {
        head: branch.to_string(),
    };
    match client.interpret(effect).await {
        Ok(GitHubResponse::OpenPullRequest(found)) => Ok(found),
        Ok(_) => Err(PublishError::UnexpectedResponse {
            step: PublishStep::PullRequest,
        }),
        Err(source) => Err(PublishError::Api {
            step: PublishStep::PullRequest,
            source,
        }),
    }
}

/// Runs steps 2 to 5 on top of a resolved base.
pub async fn publish<I: GitHubInterpreter>(
    client: &I,
    base: BaseRef,
    plan: &PatchPlan,
) -> Result<PullRequestResult, PublishError> {
    let blobs = create_blobs(client, base, &plan.file_changes).await?;
    let tree = create_tree(client, blobs).await?;
    let commit = create_commit(client, tree, plan.commit_message()).await?;
    let result = open_pull_request(client, commit, plan).await?;

    info!(
        pr = result.number,
        branch = %result.branch_name,
        commit = %result.commit_sha.short(),
        "Opened pull request"
    );
    Ok(result)
}
