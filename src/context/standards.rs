//! Standards document fetch with a per-repository TTL cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::Clock;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::RepoId;

use super::decode::decode_content;
use super::error::ContextError;

/// Where the standards document lives unless configured otherwise.
pub const DEFAULT_STANDARDS_PATH: &str = ".github/AGENT_STANDARDS.md";

/// How long a fetched (or confirmed absent) document is reused.
pub const STANDARDS_TTL_SECS: i64 = 10 * 60;

#[derive(Debug, Clone)]
struct CachedStandards {
    content: Option<String>,
    fetched_at: DateTime<Utc>,
}

/// Caches the standards document per repository.
///
/// Absence is cached as well, so a repository without the document costs one
/// lookup per TTL rather than one per delivery.
pub struct StandardsCache {
    path: String,
    ttl: TimeDelta,
    entries: RwLock<HashMap<RepoId, CachedStandards>>,
    clock: Arc<dyn Clock>,
}

impl StandardsCache {
    pub fn new(path: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        StandardsCache {
            path: path.into(),
            ttl: TimeDelta::seconds(STANDARDS_TTL_SECS),
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the standards document for `repo`, fetching it at `git_ref`
    /// when the cached copy is missing or older than the TTL.
    ///
    /// A 404 yields `Ok(None)`; any other failure is returned.
    pub async fn get<I: GitHubInterpreter>(
        &self,
        client: &I,
        repo: &RepoId,
        git_ref: &str,
    ) -> Result<Option<String>, ContextError> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(repo) {
                if now - cached.fetched_at < self.ttl {
                    debug!(repo = %repo, present = cached.content.is_some(), "Standards cache hit");
                    return Ok(cached.content.clone());
                }
            }
        }

        let content = self.fetch(client, git_ref).await?;
        info!(
            repo = %repo,
            path = %self.path,
            present = content.is_some(),
            "Fetched standards document"
        );

        self.entries.write().await.insert(
            repo.clone(),
            CachedStandards {
                content: content.clone(),
                fetched_at: now,
            },
        );
        Ok(content)
    }

    async fn fetch<I: GitHubInterpreter>(
        &self,
        client: &I,
        git_ref: &str,
    ) -> Result<Option<String>, ContextError> {
        let effect = GitHubEffect::GetFileContent {
            path: self.path.clone(),
            git_ref: git_ref.to_string(),
        };
        match client.interpret(effect).await {
            Ok(GitHubResponse::FileContent(raw)) => decode_content(&raw),
            Ok(_) => Err(ContextError::UnexpectedResponse {
                effect: "get_file_content",
            }),
            Err(e) if e.is_not_found() => Ok(None),
            Err(source) => Err(ContextError::Fetch {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
