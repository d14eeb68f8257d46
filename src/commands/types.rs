//! The activation command parsed from a comment.

use serde::{Deserialize, Serialize};

/// The result of scanning a comment for an activation phrase.
///
/// Immutable once parsed. When `activated` is false the delivery is a no-op
/// and no downstream work (authentication, model calls) happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationCommand {
    /// Whether a trigger alias was found.
    pub activated: bool,

    /// Path-like tokens that followed the trigger, in order, duplicates kept.
    pub target_paths: Vec<String>,
}

impl ActivationCommand {
    /// The command for a comment with no trigger.
    pub fn inactive() -> Self {
        Self::default()
    }

    /// An activation with the given target paths.
    pub fn activated(target_paths: Vec<String>) -> Self {
        ActivationCommand {
            activated: true,
            target_paths,
        }
    }
}
