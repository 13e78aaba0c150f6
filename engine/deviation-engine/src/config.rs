//! Engine configuration with sane defaults.

use std::env;
use std::path::PathBuf;

use crate::error::EngineError;
use crate::settings::Scheme;
use crate::verdict::DEFAULT_THRESHOLD;

pub const ENV_SETTINGS: &str = "DEVIATION_SETTINGS";
pub const ENV_THRESHOLD: &str = "DEVIATION_THRESHOLD";
pub const ENV_SCHEME: &str = "DEVIATION_SCHEME";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// Largest deviation still reported as compatible.
  pub threshold: f64,
  /// Location of the JSON settings document.
  pub settings_path: PathBuf,
  /// Scheme of the document written on first run.
  pub scheme: Scheme,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      threshold: DEFAULT_THRESHOLD,
      settings_path: PathBuf::from("settings.json"),
      scheme: Scheme::Analysis,
    }
  }
}

impl Config {
  /// Defaults overridden by `DEVIATION_SETTINGS`, `DEVIATION_THRESHOLD` and
  /// `DEVIATION_SCHEME` when set.
  pub fn from_env() -> Result<Self, EngineError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
    let mut config = Self::default();
    if let Some(path) = lookup(ENV_SETTINGS).filter(|p| !p.trim().is_empty()) {
      config.settings_path = PathBuf::from(path);
    }
    if let Some(raw) = lookup(ENV_THRESHOLD) {
      let threshold: f64 = raw
        .trim()
        .parse()
        .map_err(|e| EngineError::parse(format!("{}: {}", ENV_THRESHOLD, e)))?;
      if !threshold.is_finite() || threshold <= 0.0 {
        return Err(EngineError::validation(ENV_THRESHOLD, "must be a positive number"));
      }
      config.threshold = threshold;
    }
    if let Some(raw) = lookup(ENV_SCHEME) {
      config.scheme = raw.parse()?;
    }
    Ok(config)
  }
}
