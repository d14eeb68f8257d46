//! Octocrab client wrapper scoped to a specific repository.
//!
//! This module provides `OctocrabClient`, which wraps an `Octocrab` instance
//! and scopes all operations to a specific repository. This matches the design
//! where effects are repo-scoped (the `GitHubEffect` enum doesn't include repo info).

use std::time::Duration;

use octocrab::Octocrab;

use crate::effects::GitHubConnector;
use crate::types::RepoId;

use super::error::GitHubApiError;

/// A GitHub API client scoped to a specific repository.
///
/// All operations performed through this client target the same repository
/// and are bounded by the same per-request timeout.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    repo: RepoId,
    timeout: Duration,
}

impl OctocrabClient {
    pub fn new(client: Octocrab, repo: RepoId, timeout: Duration) -> Self {
        Self {
            client,
            repo,
            timeout,
        }
    }

    /// Creates a client that sends `token` as a bearer credential.
    ///
    /// Octocrab sends a "personal token" as `Authorization: Bearer`, which is
    /// what GitHub expects for both App assertions and installation tokens.
    pub fn from_token(
        token: &str,
        repo: RepoId,
        base_uri: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(uri) = base_uri {
            builder = builder.base_uri(uri)?;
        }
        Ok(Self::new(builder.build()?, repo, timeout))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Returns the repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    /// Returns the deadline applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builds `OctocrabClient`s against the public API or a configured base URL.
#[derive(Debug, Clone)]
pub struct OctocrabConnector {
    base_uri: Option<String>,
    timeout: Duration,
}

impl OctocrabConnector {
    pub fn new(base_uri: Option<String>, timeout: Duration) -> Self {
        Self { base_uri, timeout }
    }
}

impl GitHubConnector for OctocrabConnector {
    type Client = OctocrabClient;

    fn connect(&self, token: &str, repo: &RepoId) -> Result<OctocrabClient, GitHubApiError> {
        OctocrabClient::from_token(token, repo.clone(), self.base_uri.as_deref(), self.timeout)
            .map_err(GitHubApiError::from_octocrab)
    }
}
