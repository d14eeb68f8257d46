//! Repository context for the patch prompt.
//!
//! Two sources feed the prompt: the repository's standards document, cached
//! per repository, and the files the comment named explicitly. Both degrade
//! gracefully when content is missing.

pub mod decode;
pub mod error;
pub mod files;
pub mod standards;

pub use decode::decode_content;
pub use error::ContextError;
pub use files::{DEFAULT_MAX_FILE_BYTES, RepositoryFile, gather_files};
pub use standards::{DEFAULT_STANDARDS_PATH, STANDARDS_TTL_SECS, StandardsCache};

use crate::effects::GitHubInterpreter;
use crate::types::RepoId;

/// Everything the prompt needs from the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryContext {
    pub standards: Option<String>,
    pub files: Vec<RepositoryFile>,
}

/// Reads the standards document at `branch` and the target files at `commit`.
///
/// The two reads run concurrently.
pub async fn gather<I: GitHubInterpreter>(
    client: &I,
    standards: &StandardsCache,
    repo: &RepoId,
    branch: &str,
    commit: &str,
    paths: &[String],
    max_file_bytes: usize,
) -> Result<RepositoryContext, ContextError> {
    let (standards, files) = futures::try_join!(
        standards.get(client, repo, branch),
        gather_files(client, paths, commit, max_file_bytes),
    )?;
    Ok(RepositoryContext { standards, files })
}
