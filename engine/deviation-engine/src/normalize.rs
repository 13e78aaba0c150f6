//! Normalize field text into the two counts the calculator consumes.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::Counts;

/// Unit a count was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
  /// Raw number of shocks.
  Count,
  /// Counts per second.
  Cps,
  /// Counts per minute.
  Cpm,
}

impl Unit {
  /// Multiplier bringing a value in this unit to a raw count over `time` minutes.
  pub fn factor(self, time: u32) -> f64 {
    match self {
      Self::Count => 1.0,
      Self::Cps => 60.0 * f64::from(time),
      Self::Cpm => f64::from(time),
    }
  }

  /// Whether the time base changes the result for this unit.
  pub fn uses_time(self) -> bool {
    !matches!(self, Self::Count)
  }
}

/// How both counts are rescaled before comparison. Identical for both inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
  /// Fixed multiplier carried by the selected analysis.
  Factor(f64),
  /// Unit plus time base in minutes.
  UnitTime { unit: Unit, time: u32 },
}

impl Normalization {
  pub fn scale(&self) -> f64 {
    match *self {
      Self::Factor(f) => f,
      Self::UnitTime { unit, time } => unit.factor(time),
    }
  }

  pub fn apply(&self, count1: f64, count2: f64) -> Counts {
    let k = self.scale();
    Counts {
      count1: count1 * k,
      count2: count2 * k,
    }
  }
}

/// Prepend `0` to text starting with a decimal separator: `.5` -> `0.5`, `,5` -> `0,5`.
pub fn fix_leading_separator(text: &str) -> String {
  if text.starts_with(['.', ',']) {
    format!("0{}", text)
  } else {
    text.to_string()
  }
}

/// Accept `,` as decimal point.
pub fn normalize_separator(text: &str) -> String {
  text.trim().replace(',', ".")
}

/// Parse one count field. The input gate normally guarantees well-formed
/// text; anything else is reported against `field` instead of panicking.
pub fn parse_count(field: &str, text: &str) -> Result<f64, EngineError> {
  let cleaned = normalize_separator(&fix_leading_separator(text.trim()));
  if cleaned.is_empty() {
    return Err(EngineError::validation(field, "must not be empty"));
  }
  let value: f64 = cleaned
    .parse()
    .map_err(|e| EngineError::validation(field, &format!("not a number: {}", e)))?;
  if !value.is_finite() {
    return Err(EngineError::validation(field, "must be finite"));
  }
  if value < 0.0 {
    return Err(EngineError::validation(field, "must not be negative"));
  }
  Ok(value)
}

/// Parse a time base in whole minutes (must be at least 1).
pub fn parse_time(field: &str, text: &str) -> Result<u32, EngineError> {
  let minutes: u32 = text
    .trim()
    .parse()
    .map_err(|e| EngineError::validation(field, &format!("not a whole number of minutes: {}", e)))?;
  if minutes == 0 {
    return Err(EngineError::validation(field, "must be at least 1 minute"));
  }
  Ok(minutes)
}

/// Parse both fields and bring them to a common count basis.
pub fn to_counts(text1: &str, text2: &str, normalization: &Normalization) -> Result<Counts, EngineError> {
  let count1 = parse_count("count1", text1)?;
  let count2 = parse_count("count2", text2)?;
  Ok(normalization.apply(count1, count2))
}
