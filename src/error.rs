//! The error taxonomy surfaced to callers of the agent.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::context::ContextError;
use crate::patch::PatchError;
use crate::publish::PublishError;

/// Stable names for the classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ConfigurationError,
    AuthenticationError,
    /// Optional content was absent. Logged, never returned.
    ContentNotFound,
    SchemaValidationError,
    ModelUnavailableError,
    GitOperationError,
    ModelError,
    ContextError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::AuthenticationError => "AuthenticationError",
            ErrorKind::ContentNotFound => "ContentNotFound",
            ErrorKind::SchemaValidationError => "SchemaValidationError",
            ErrorKind::ModelUnavailableError => "ModelUnavailableError",
            ErrorKind::GitOperationError => "GitOperationError",
            ErrorKind::ModelError => "ModelError",
            ErrorKind::ContextError => "ContextError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that ends a delivery.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("context gathering failed: {0}")]
    Context(#[from] ContextError),

    #[error("patch generation failed: {0}")]
    Patch(#[from] PatchError),

    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Config(_) => ErrorKind::ConfigurationError,
            AgentError::Auth(_) => ErrorKind::AuthenticationError,
            AgentError::Context(_) => ErrorKind::ContextError,
            AgentError::Patch(PatchError::SchemaValidation { .. }) => {
                ErrorKind::SchemaValidationError
            }
            AgentError::Patch(PatchError::NoModelAvailable { .. }) => {
                ErrorKind::ModelUnavailableError
            }
            AgentError::Patch(PatchError::Model(_)) => ErrorKind::ModelError,
            AgentError::Publish(_) => ErrorKind::GitOperationError,
        }
    }

    /// The publish step that failed, for Git operation errors.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            AgentError::Publish(e) => Some(e.step().as_str()),
            _ => None,
        }
    }
}
