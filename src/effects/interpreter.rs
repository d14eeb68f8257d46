//! Effect interpreter traits.
//!
//! The trait-based design enables:
//! - Mock interpreters for testing
//! - Swapping the credential an interpreter acts with (App assertion vs
//!   installation token) without touching the callers

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::RepoId;

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId` and a bearer credential,
/// so all effects executed through a single interpreter instance are scoped
/// to that repository and act with that credential.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| GitHubApiError::not_found(format!("unexpected effect: {:?}", effect)))
///     }
/// }
/// ```
pub trait GitHubInterpreter: Send + Sync {
    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, GitHubApiError>> + Send;
}

/// Creates interpreters bound to a bearer token and a repository.
///
/// The authenticator connects with the App's signed assertion; the
/// per-delivery pipeline connects with the installation token it gets back.
pub trait GitHubConnector: Send + Sync {
    /// The interpreter type this connector produces.
    type Client: GitHubInterpreter;

    /// Builds an interpreter that authenticates with `token` against `repo`.
    fn connect(&self, token: &str, repo: &RepoId) -> Result<Self::Client, GitHubApiError>;
}
