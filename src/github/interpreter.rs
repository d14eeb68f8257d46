//! GitHub effect interpreter using octocrab.
//!
//! This module implements the `GitHubInterpreter` trait, executing GitHub effects
//! against the real GitHub API via octocrab's generic REST methods.
//!
//! Key implementation details:
//! - Every call runs under `tokio::time::timeout` with the client's deadline
//! - Path segments are percent-encoded individually so `/` stays a separator
//! - Directory listings from the contents API are reported as `kind = "dir"`
//!   rather than failing to deserialize

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{
    GitHubEffect, GitHubInterpreter, GitHubResponse, PullRequestRef, RawFileContent, TreeEntry,
};
use crate::types::{InstallationId, Sha};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
///
/// The call is abandoned with a `Timeout` error once the client's deadline
/// passes.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    let name = effect.name();
    debug!(effect = name, repo = %client.repo(), "executing GitHub effect");

    match tokio::time::timeout(client.timeout(), execute_effect(client, effect)).await {
        Ok(result) => result,
        Err(_) => Err(GitHubApiError::timeout(format!(
            "{} did not complete within {:?}",
            name,
            client.timeout()
        ))),
    }
}

async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetRepoInstallation => get_repo_installation(client).await,
        GitHubEffect::CreateInstallationToken { installation_id } => {
            create_installation_token(client, installation_id).await
        }
        GitHubEffect::GetFileContent { path, git_ref } => {
            get_file_content(client, path, git_ref).await
        }
        GitHubEffect::GetRef { branch } => get_ref(client, branch).await,
        GitHubEffect::CreateBlob { content } => create_blob(client, content).await,
        GitHubEffect::CreateTree { base_tree, entries } => {
            create_tree(client, base_tree, entries).await
        }
        GitHubEffect::CreateCommit {
            message,
            tree,
            parents,
        } => create_commit(client, message, tree, parents).await,
        GitHubEffect::CreateRef { branch, sha } => create_ref(client, branch, sha).await,
        GitHubEffect::CreatePullRequest {
            title,
            body,
            head,
            base,
        } => create_pull_request(client, title, body, head, base).await,
        GitHubEffect::GetOpenPullRequest { head } => get_open_pull_request(client, head).await,
    }
}

/// Percent-encodes each `/`-separated segment of a path.
///
/// This is a pure function extracted for testability.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn repo_route(client: &OctocrabClient, suffix: &str) -> String {
    format!(
        "/repos/{}/{}/{}",
        client.owner(),
        client.repo_name(),
        suffix
    )
}

/// Minimal `{"sha": ...}` response shared by blobs, trees and commits.
#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

// ─── App Authentication ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InstallationResponse {
    id: u64,
}

/// Narrows the installation token to the one repository being patched.
#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    repositories: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

async fn get_repo_installation(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "installation");
    let response: InstallationResponse = client
        .inner()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Installation {
        id: InstallationId(response.id),
    })
}

async fn create_installation_token(
    client: &OctocrabClient,
    installation_id: InstallationId,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/app/installations/{}/access_tokens", installation_id.0);
    let request = AccessTokenRequest {
        repositories: [client.repo_name()],
    };
    let response: AccessTokenResponse = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::InstallationToken {
        token: response.token,
        expires_at: response.expires_at,
    })
}

// ─── Contents ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ContentsQuery<'a> {
    r#ref: &'a str,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    encoding: Option<String>,
    content: Option<String>,
}

async fn get_file_content(
    client: &OctocrabClient,
    path: String,
    git_ref: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("contents/{}", encode_path(&path)));
    let value: serde_json::Value = client
        .inner()
        .get(&route, Some(&ContentsQuery { r#ref: &git_ref }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::FileContent(contents_from_value(
        &path, value,
    )?))
}

/// Interprets a contents API body. An array is a directory listing.
fn contents_from_value(
    path: &str,
    value: serde_json::Value,
) -> Result<RawFileContent, GitHubApiError> {
    if value.is_array() {
        return Ok(RawFileContent {
            path: path.to_string(),
            sha: Sha::new(""),
            kind: "dir".to_string(),
            encoding: None,
            content: None,
        });
    }

    let response: ContentsResponse = serde_json::from_value(value).map_err(|e| {
        GitHubApiError::other(format!("unexpected contents response for {}: {}", path, e))
    })?;

    Ok(RawFileContent {
        path: response.path,
        sha: Sha::new(response.sha),
        kind: response.kind,
        encoding: response.encoding,
        content: response.content,
    })
}

// ─── Git Database ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaResponse,
}

async fn get_ref(client: &OctocrabClient, branch: String) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("git/ref/heads/{}", encode_path(&branch)));
    let response: RefResponse = client
        .inner()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Ref {
        sha: Sha::new(response.object.sha),
    })
}

#[derive(Debug, Serialize)]
struct BlobRequest<'a> {
    content: &'a str,
    encoding: &'static str,
}

async fn create_blob(
    client: &OctocrabClient,
    content: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "git/blobs");
    let request = BlobRequest {
        content: &content,
        encoding: "utf-8",
    };
    let response: ShaResponse = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::BlobCreated {
        sha: Sha::new(response.sha),
    })
}

#[derive(Debug, Serialize)]
struct TreeRequest<'a> {
    base_tree: &'a str,
    tree: &'a [TreeEntry],
}

async fn create_tree(
    client: &OctocrabClient,
    base_tree: Sha,
    entries: Vec<TreeEntry>,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "git/trees");
    let request = TreeRequest {
        base_tree: base_tree.as_str(),
        tree: &entries,
    };
    let response: ShaResponse = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::TreeCreated {
        sha: Sha::new(response.sha),
    })
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

async fn create_commit(
    client: &OctocrabClient,
    message: String,
    tree: Sha,
    parents: Vec<Sha>,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "git/commits");
    let request = CommitRequest {
        message: &message,
        tree: tree.as_str(),
        parents: parents.iter().map(Sha::as_str).collect(),
    };
    let response: ShaResponse = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommitCreated {
        sha: Sha::new(response.sha),
    })
}

#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    r#ref: String,
    sha: &'a str,
}

async fn create_ref(
    client: &OctocrabClient,
    branch: String,
    sha: Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "git/refs");
    let request = CreateRefRequest {
        r#ref: format!("refs/heads/{}", branch),
        sha: sha.as_str(),
    };
    let _: serde_json::Value = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::RefCreated)
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PullRequestRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    number: u64,
    html_url: String,
}

async fn create_pull_request(
    client: &OctocrabClient,
    title: String,
    body: String,
    head: String,
    base: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "pulls");
    let request = PullRequestRequest {
        title: &title,
        body: &body,
        head: &head,
        base: &base,
    };
    let response: PullRequestResponse = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::PullRequestCreated {
        number: response.number,
        url: response.html_url,
    })
}

#[derive(Debug, Serialize)]
struct OpenPullsQuery {
    head: String,
    state: &'static str,
}

async fn get_open_pull_request(
    client: &OctocrabClient,
    head: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, "pulls");
    let query = OpenPullsQuery {
        head: format!("{}:{}", client.owner(), head),
        state: "open",
    };
    let response: Vec<PullRequestResponse> = client
        .inner()
        .get(&route, Some(&query))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::OpenPullRequest(
        response.into_iter().next().map(|pr| PullRequestRef {
            number: pr.number,
            url: pr.html_url,
        }),
    ))
}
