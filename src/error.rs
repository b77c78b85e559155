//! Error types for editor operations.

use thiserror::Error;

use crate::animation::AnimationError;
use crate::types::ObjectId;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced by the editing engine.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The SVG markup could not be decoded or parsed at all.
    #[error("import failed: {0}")]
    Import(String),

    /// Scene or object (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No object with this id exists in the scene.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// A JSON command was malformed or named an unknown action.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Editor configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An animation preview could not be started.
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

impl EditorError {
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
