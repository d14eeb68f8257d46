//! Target file gathering.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::error::ErrorKind;
use crate::types::Sha;

use super::decode::decode_content;
use super::error::ContextError;

/// Default cap on the decoded size of a single target file.
pub const DEFAULT_MAX_FILE_BYTES: usize = 100 * 1024;

/// A file read from the repository for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub path: String,
    pub content: String,
    pub sha: Sha,
    /// Set when `content` was cut to the size cap.
    pub truncated: bool,
}

/// Fetches `paths` at `git_ref` concurrently.
///
/// Duplicate paths are read once and the result keeps first-occurrence order.
/// Paths that don't exist, name a directory, or hold content that can't be
/// read as text (binary files, files too large for the contents API) are
/// dropped with a warning. Any other failure aborts the whole gather.
pub async fn gather_files<I: GitHubInterpreter>(
    client: &I,
    paths: &[String],
    git_ref: &str,
    max_bytes: usize,
) -> Result<Vec<RepositoryFile>, ContextError> {
    let mut unique: Vec<&str> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path.as_str()) {
            unique.push(path);
        }
    }

    let fetches = unique
        .iter()
        .map(|path| fetch_file(client, path, git_ref, max_bytes));
    let results = join_all(fetches).await;

    let mut files = Vec::with_capacity(results.len());
    for (path, result) in unique.iter().zip(results) {
        match result? {
            Some(file) => files.push(file),
            None => warn!(
                path = %path,
                git_ref = %git_ref,
                kind = %ErrorKind::ContentNotFound,
                "Target file not found, continuing without it"
            ),
        }
    }

    debug!(requested = paths.len(), fetched = files.len(), "Gathered target files");
    Ok(files)
}

async fn fetch_file<I: GitHubInterpreter>(
    client: &I,
    path: &str,
    git_ref: &str,
    max_bytes: usize,
) -> Result<Option<RepositoryFile>, ContextError> {
    let effect = GitHubEffect::GetFileContent {
        path: path.to_string(),
        git_ref: git_ref.to_string(),
    };
    let raw = match client.interpret(effect).await {
        Ok(GitHubResponse::FileContent(raw)) => raw,
        Ok(_) => {
            return Err(ContextError::UnexpectedResponse {
                effect: "get_file_content",
            });
        }
        Err(e) if e.is_not_found() => return Ok(None),
        Err(source) => {
            return Err(ContextError::Fetch {
                path: path.to_string(),
                source,
            });
        }
    };

    let content = match decode_content(&raw) {
        Ok(Some(content)) => content,
        Ok(None) => return Ok(None),
        Err(ContextError::Decode { reason, .. }) => {
            warn!(
                path = %path,
                git_ref = %git_ref,
                reason = %reason,
                "Target file is not readable as text, continuing without it"
            );
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    let (content, truncated) = truncate_to(content, max_bytes);

    Ok(Some(RepositoryFile {
        path: path.to_string(),
        content,
        sha: raw.sha,
        truncated,
    }))
}

/// Cuts `content` to at most `max_bytes`, backing off to a char boundary.
fn truncate_to(mut content: String, max_bytes: usize) -> (String, bool) {
    if content.len() <= max_bytes {
        return (content, false);
    }
    let mut end = max_bytes;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    content.truncate(end);
    (content, true)
}
