//! Error types
//!
//! Missing sounds and fonts are not errors (lookups return `None`); everything
//! here either aborts startup or escapes the simulation loop.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::ActorId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("image asset not found: {name}")]
    MissingImage { name: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("level {level:?} is malformed: {reason}")]
    MalformedLevel { level: String, reason: String },

    #[error("no level files found in {0}")]
    NoLevels(PathBuf),

    #[error("actor {0:?} is not in the simulation")]
    UnknownActor(ActorId),

    #[error("display error: {0}")]
    Display(String),

    #[error("render thread failed: {0}")]
    RenderThread(String),
}

impl GameError {
    pub(crate) fn malformed(level: &str, reason: impl Into<String>) -> Self {
        GameError::MalformedLevel {
            level: level.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
