//! App authenticator: private key to installation token.

use std::sync::Arc;

use tracing::{debug, info};

use crate::effects::{GitHubConnector, GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{InstallationId, RepoId};

use super::cache::{CredentialCache, InstallationCredential};
use super::clock::Clock;
use super::error::AuthError;
use super::jwt::AppSigner;

/// Issues installation credentials, reusing cached ones while they are fresh.
pub struct AppAuthenticator {
    signer: AppSigner,
    cache: CredentialCache,
    clock: Arc<dyn Clock>,
}

impl AppAuthenticator {
    pub fn new(signer: AppSigner, clock: Arc<dyn Clock>) -> Self {
        AppAuthenticator {
            signer,
            cache: CredentialCache::new(),
            clock,
        }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// Returns a credential scoped to `repo`.
    ///
    /// On a cache miss this signs a fresh assertion, resolves the installation
    /// (skipped when the webhook already named it) and exchanges the assertion
    /// for an installation token.
    pub async fn credential<C: GitHubConnector>(
        &self,
        connector: &C,
        repo: &RepoId,
        installation_hint: Option<InstallationId>,
    ) -> Result<InstallationCredential, AuthError> {
        let now = self.clock.now();
        if let Some(credential) = self.cache.get_fresh(repo, now).await {
            debug!(repo = %repo, expires_at = %credential.expires_at, "Reusing cached installation token");
            return Ok(credential);
        }

        let assertion = self.signer.sign(now)?;
        let app_client = connector
            .connect(&assertion, repo)
            .map_err(|source| AuthError::Identity {
                step: "app_client",
                source,
            })?;

        let installation_id = match installation_hint {
            Some(id) => id,
            None => resolve_installation(&app_client, repo).await?,
        };

        let credential = exchange_token(&app_client, installation_id).await?;
        info!(
            repo = %repo,
            installation_id = %installation_id,
            expires_at = %credential.expires_at,
            "Obtained installation token"
        );

        self.cache.store(repo.clone(), credential.clone()).await;
        Ok(credential)
    }
}

async fn resolve_installation<I: GitHubInterpreter>(
    client: &I,
    repo: &RepoId,
) -> Result<InstallationId, AuthError> {
    match client.interpret(GitHubEffect::GetRepoInstallation).await {
        Ok(GitHubResponse::Installation { id }) => Ok(id),
        Ok(_) => Err(AuthError::UnexpectedResponse {
            effect: "get_repo_installation",
        }),
        Err(e) if e.is_not_found() => Err(AuthError::InstallationNotFound { repo: repo.clone() }),
        Err(source) => Err(AuthError::Identity {
            step: "installation lookup",
            source,
        }),
    }
}

async fn exchange_token<I: GitHubInterpreter>(
    client: &I,
    installation_id: InstallationId,
) -> Result<InstallationCredential, AuthError> {
    match client
        .interpret(GitHubEffect::CreateInstallationToken { installation_id })
        .await
    {
        Ok(GitHubResponse::InstallationToken { token, expires_at }) => {
            Ok(InstallationCredential { token, expires_at })
        }
        Ok(_) => Err(AuthError::UnexpectedResponse {
            effect: "create_installation_token",
        }),
        Err(source) => Err(AuthError::Identity {
            step: "token exchange",
            source,
        }),
    }
}
