//! Core types for the deviation engine (JSON contracts + internal models).

use serde::{Deserialize, Serialize};

use crate::settings::Scheme;
use crate::verdict::Verdict;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the presentation layer sends)
// ---------------------------------------------------------------------------

/// One user action, one JSON line on stdin. Unknown fields are silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InboundAction {
  SetCount1 { value: String },
  SetCount2 { value: String },
  SetTime { value: String },
  SelectMode { mode: String },
  Clear,
  View,
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// The two counts handed to the calculator, already on a common basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counts {
  pub count1: f64,
  pub count2: f64,
}

/// The three text fields the form tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  Count1,
  Count2,
  Time,
}

impl Field {
  pub fn name(self) -> &'static str {
    match self {
      Self::Count1 => "count1",
      Self::Count2 => "count2",
      Self::Time => "time",
    }
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeOption {
  pub key: String,
  pub name: String,
}

/// Snapshot of the form, rendered by whatever front end drives the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
  pub scheme: Scheme,
  pub mode: String,
  pub mode_name: String,
  pub modes: Vec<ModeOption>,
  pub label1: String,
  pub label2: String,
  pub count1: String,
  pub count2: String,
  /// Present only when the selected mode scales by a time base.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time: Option<String>,
  pub verdict: Verdict,
  pub result_text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result_color: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deviation: Option<f64>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for rejected or unparseable input lines.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn actions_parse_from_tagged_json() {
    let a: InboundAction = serde_json::from_str(r#"{"action":"set_count1","value":"12"}"#).unwrap();
    assert_eq!(a, InboundAction::SetCount1 { value: "12".into() });

    let a: InboundAction = serde_json::from_str(r#"{"action":"select_mode","mode":"1"}"#).unwrap();
    assert_eq!(a, InboundAction::SelectMode { mode: "1".into() });

    let a: InboundAction = serde_json::from_str(r#"{"action":"clear","extra":true}"#).unwrap();
    assert_eq!(a, InboundAction::Clear);
  }

  #[test]
  fn unknown_action_is_rejected() {
    let res: Result<InboundAction, _> = serde_json::from_str(r#"{"action":"explode"}"#);
    assert!(res.is_err());
  }

  #[test]
  fn error_output_skips_missing_field() {
    let json = serde_json::to_string(&ErrorOutput::new("boom")).unwrap();
    assert_eq!(json, r#"{"error":true,"message":"boom"}"#);
    let json = serde_json::to_string(&ErrorOutput::new("boom").with_field("time")).unwrap();
    assert!(json.contains(r#""field":"time""#));
  }
}
