//! Three-way classification of a deviation.

use serde::{Deserialize, Serialize};

/// Default compatibility bound; a deviation equal to it is still compatible.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  #[default]
  NoData,
  Compatible,
  Incompatible,
}

impl Verdict {
  /// `None` (nothing computed) maps to `NoData`.
  pub fn classify(deviation: Option<f64>, threshold: f64) -> Self {
    match deviation {
      None => Self::NoData,
      Some(d) if d > threshold => Self::Incompatible,
      Some(_) => Self::Compatible,
    }
  }

  /// Result label text.
  pub fn text(self) -> &'static str {
    match self {
      Self::NoData => "",
      Self::Compatible => "OK",
      Self::Incompatible => "INCOMPATIBLES",
    }
  }

  /// Result label color; the empty label has none.
  pub fn color(self) -> Option<&'static str> {
    match self {
      Self::NoData => None,
      Self::Compatible => Some("green"),
      Self::Incompatible => Some("red"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn boundary_is_compatible() {
    assert_eq!(Verdict::classify(Some(1.0), DEFAULT_THRESHOLD), Verdict::Compatible);
    assert_eq!(Verdict::classify(Some(1.000_001), DEFAULT_THRESHOLD), Verdict::Incompatible);
    assert_eq!(Verdict::classify(Some(0.0), DEFAULT_THRESHOLD), Verdict::Compatible);
  }

  #[test]
  fn missing_deviation_is_no_data() {
    assert_eq!(Verdict::classify(None, DEFAULT_THRESHOLD), Verdict::NoData);
    assert_eq!(Verdict::NoData.text(), "");
    assert_eq!(Verdict::NoData.color(), None);
  }

  #[test]
  fn custom_threshold() {
    assert_eq!(Verdict::classify(Some(1.5), 2.0), Verdict::Compatible);
    assert_eq!(Verdict::classify(Some(2.5), 2.0), Verdict::Incompatible);
  }

  #[test]
  fn presentation() {
    assert_eq!(Verdict::Compatible.text(), "OK");
    assert_eq!(Verdict::Compatible.color(), Some("green"));
    assert_eq!(Verdict::Incompatible.text(), "INCOMPATIBLES");
    assert_eq!(Verdict::Incompatible.color(), Some("red"));
    assert_eq!(serde_json::to_string(&Verdict::NoData).unwrap(), r#""no_data""#);
  }
}
