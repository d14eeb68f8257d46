//! Installation credential cache.
//!
//! One entry per repository, shared by every delivery. Readers take the read
//! lock; a refresh takes the write lock only to store its result, never
//! across the network call. Two deliveries that find the same stale entry may
//! both refresh; the later write wins and both tokens are valid.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::types::RepoId;

/// How long before expiry a credential stops being handed out.
pub const REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// A repository-scoped installation access token.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallationCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationCredential {
    /// True while `now < expires_at - 5 min`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - TimeDelta::seconds(REFRESH_BUFFER_SECS)
    }
}

impl std::fmt::Debug for InstallationCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationCredential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credentials keyed by repository.
#[derive(Debug, Default)]
pub struct CredentialCache {
    entries: RwLock<HashMap<RepoId, InstallationCredential>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached credential for `repo` if it is still fresh at `now`.
    pub async fn get_fresh(&self, repo: &RepoId, now: DateTime<Utc>) -> Option<InstallationCredential> {
        let entries = self.entries.read().await;
        entries
            .get(repo)
            .filter(|credential| credential.is_fresh(now))
            .cloned()
    }

    /// Replaces the cached credential for `repo`.
    pub async fn store(&self, repo: RepoId, credential: InstallationCredential) {
        self.entries.write().await.insert(repo, credential);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
