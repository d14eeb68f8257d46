//! The typed patch plan a model response decodes into.

use serde::Serialize;

/// What to do with one path.
///
/// Deletes carry no content, so the type can't express a delete with a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", content = "content", rename_all = "snake_case")]
pub enum ChangeKind {
    Add(String),
    Modify(String),
    Delete,
}

/// A whole-file change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

impl FileChange {
    pub fn add(path: impl Into<String>, content: impl Into<String>) -> Self {
        FileChange {
            path: path.into(),
            kind: ChangeKind::Add(content.into()),
        }
    }

    pub fn modify(path: impl Into<String>, content: impl Into<String>) -> Self {
        FileChange {
            path: path.into(),
            kind: ChangeKind::Modify(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        FileChange {
            path: path.into(),
            kind: ChangeKind::Delete,
        }
    }

    /// The wire name of the operation.
    pub fn operation(&self) -> &'static str {
        match self.kind {
            ChangeKind::Add(_) => "add",
            ChangeKind::Modify(_) => "modify",
            ChangeKind::Delete => "delete",
        }
    }

    /// The new file content, absent for deletes.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            ChangeKind::Add(content) | ChangeKind::Modify(content) => Some(content),
            ChangeKind::Delete => None,
        }
    }
}

/// A validated description of the change to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchPlan {
    pub commit_title: String,
    pub branch_name: String,
    pub description: String,
    pub file_changes: Vec<FileChange>,
}

impl PatchPlan {
    /// Title and description joined the way git expects a message.
    pub fn commit_message(&self) -> String {
        if self.description.trim().is_empty() {
            self.commit_title.clone()
        } else {
            format!("{}\n\n{}", self.commit_title, self.description.trim_end())
        }
    }
}
