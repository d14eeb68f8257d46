//! Authentication error types.

use thiserror::Error;

use crate::github::GitHubApiError;
use crate::types::RepoId;

/// Errors raised while turning the App's private key into an installation token.
///
/// None of these are retried: each one fails the current delivery.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The private key is PEM but not in the encoding the signer requires.
    #[error("private key must be {expected} encoded, found {found}")]
    WrongKeyEncoding {
        expected: &'static str,
        found: &'static str,
    },

    /// The private key has the right armour but its contents were rejected.
    #[error("private key could not be loaded: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    /// Signing the assertion failed.
    #[error("failed to sign app assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The App is not installed on the repository.
    #[error("no app installation found for {repo}")]
    InstallationNotFound { repo: RepoId },

    /// The identity endpoint failed or was unreachable.
    #[error("{step} failed: {source}")]
    Identity {
        step: &'static str,
        #[source]
        source: GitHubApiError,
    },

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected response to {effect}")]
    UnexpectedResponse { effect: &'static str },
}
