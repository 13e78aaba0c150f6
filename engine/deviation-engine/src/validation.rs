//! Input gate: decides which texts a field may hold for the selected mode.

use regex::{Regex, RegexBuilder};

use crate::error::EngineError;

/// Compiled field pattern. Matching is anchored at both ends, so the whole
/// text must match; the empty text is always allowed (a cleared field).
/// Classes are ASCII-only: `\d` never admits digits the number parser rejects.
#[derive(Debug, Clone)]
pub struct InputGate {
  pattern: String,
  re: Regex,
}

impl InputGate {
  pub fn new(field: &str, pattern: &str) -> Result<Self, EngineError> {
    let re = RegexBuilder::new(&format!("^(?:{})$", pattern))
      .unicode(false)
      .build()
      .map_err(|source| EngineError::Pattern {
        field: field.to_string(),
        source,
      })?;
    Ok(Self {
      pattern: pattern.to_string(),
      re,
    })
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn accepts(&self, text: &str) -> bool {
    text.is_empty() || self.re.is_match(text)
  }
}
