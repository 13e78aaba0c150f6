//! Structured error types for the deviation engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("parse: {0}")]
  Parse(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("settings io: {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("settings corrupt: {path}: {source}")]
  Corrupt {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("pattern: {field}: {source}")]
  Pattern {
    field: String,
    #[source]
    source: regex::Error,
  },

  #[error("unknown mode: {0}")]
  UnknownMode(String),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }

  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  /// Field name for errors tied to one input, used by the adapter's error line.
  pub fn field(&self) -> Option<&str> {
    match self {
      Self::Validation { field, .. } | Self::Pattern { field, .. } => Some(field),
      _ => None,
    }
  }
}
