//! Settings document (default mode, time base, per-mode labels and input
//! patterns) and the repositories that load and save it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::normalize::{Normalization, Unit};
use crate::validation::InputGate;

/// Positive integers, no leading zero.
pub const INTEGER_PATTERN: &str = r"[1-9]\d*";
/// Decimal number, `.` or `,` separator, at most two fractional digits.
pub const DECIMAL_PATTERN: &str = r"[1-9]?\d*((\.|,)\d{0,2})?";

const DEFAULT_TIME: u32 = 1;

/// Normalization family of a deployment. One form never mixes the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
  /// Each mode is an analysis with a fixed multiplier.
  #[default]
  Analysis,
  /// Each mode is a unit; a time base in minutes applies.
  UnitTime,
}

impl std::str::FromStr for Scheme {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "analysis" => Ok(Self::Analysis),
      "unit_time" | "unit-time" | "unit" => Ok(Self::UnitTime),
      other => Err(EngineError::parse(format!("unknown scheme {:?}", other))),
    }
  }
}

/// Presentation metadata and scaling of one selectable mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
  #[serde(rename = "analysis")]
  pub name: String,
  pub label1: String,
  pub label2: String,
  pub regex: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub factor: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unit: Option<Unit>,
}

impl ModeSettings {
  fn analysis(name: &str, label1: &str, label2: &str, regex: &str, factor: f64) -> Self {
    Self {
      name: name.to_string(),
      label1: label1.to_string(),
      label2: label2.to_string(),
      regex: regex.to_string(),
      factor: Some(factor),
      unit: None,
    }
  }

  fn unit(name: &str, label1: &str, label2: &str, regex: &str, unit: Unit) -> Self {
    Self {
      name: name.to_string(),
      label1: label1.to_string(),
      label2: label2.to_string(),
      regex: regex.to_string(),
      factor: None,
      unit: Some(unit),
    }
  }

  pub fn uses_time(&self) -> bool {
    self.unit.is_some_and(Unit::uses_time)
  }

  pub fn normalization(&self, time: u32) -> Normalization {
    match self.unit {
      Some(unit) => Normalization::UnitTime { unit, time },
      None => Normalization::Factor(self.factor.unwrap_or(1.0)),
    }
  }
}

fn default_time() -> u32 {
  DEFAULT_TIME
}

fn default_time_regex() -> String {
  INTEGER_PATTERN.to_string()
}

/// The whole settings file. Modes sit at the top level next to `default`,
/// keyed by their selector index ("0", "1", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
  pub default: String,
  #[serde(default)]
  pub scheme: Scheme,
  #[serde(default = "default_time")]
  pub default_time: u32,
  #[serde(default = "default_time_regex")]
  pub time_regex: String,
  #[serde(flatten)]
  pub modes: BTreeMap<String, ModeSettings>,
}

impl SettingsDocument {
  /// Alpha-Bêta (raw shocks) and Tritium (CPMA, scaled by 60).
  pub fn analysis_defaults() -> Self {
    let mut modes = BTreeMap::new();
    modes.insert(
      "0".to_string(),
      ModeSettings::analysis("Alpha-Bêta", "Coups 1 :", "Coups 2 :", INTEGER_PATTERN, 1.0),
    );
    modes.insert(
      "1".to_string(),
      ModeSettings::analysis("Tritium", "CPMA 1 :", "CPMA 2 :", DECIMAL_PATTERN, 60.0),
    );
    Self {
      default: "0".to_string(),
      scheme: Scheme::Analysis,
      default_time: DEFAULT_TIME,
      time_regex: default_time_regex(),
      modes,
    }
  }

  /// Raw count, counts per second and counts per minute over a time base.
  pub fn unit_time_defaults() -> Self {
    let mut modes = BTreeMap::new();
    modes.insert(
      "0".to_string(),
      ModeSettings::unit("Coups", "Coups 1 :", "Coups 2 :", INTEGER_PATTERN, Unit::Count),
    );
    modes.insert(
      "1".to_string(),
      ModeSettings::unit("c/s", "c/s 1 :", "c/s 2 :", DECIMAL_PATTERN, Unit::Cps),
    );
    modes.insert(
      "2".to_string(),
      ModeSettings::unit("c/min", "c/min 1 :", "c/min 2 :", DECIMAL_PATTERN, Unit::Cpm),
    );
    Self {
      default: "0".to_string(),
      scheme: Scheme::UnitTime,
      default_time: DEFAULT_TIME,
      time_regex: default_time_regex(),
      modes,
    }
  }

  pub fn defaults_for(scheme: Scheme) -> Self {
    match scheme {
      Scheme::Analysis => Self::analysis_defaults(),
      Scheme::UnitTime => Self::unit_time_defaults(),
    }
  }

  /// Documents written before modes carried a `factor` rely on the built-in
  /// analyses: a mode named like one of them takes its factor (Tritium -> 60).
  /// Returns the keys that were filled in.
  pub fn fill_missing_factors(&mut self) -> Vec<String> {
    if self.scheme != Scheme::Analysis {
      return Vec::new();
    }
    let builtin = Self::analysis_defaults();
    let mut filled = Vec::new();
    for (key, mode) in self.modes.iter_mut() {
      if mode.factor.is_some() || mode.unit.is_some() {
        continue;
      }
      let known = builtin
        .modes
        .values()
        .find(|b| b.name == mode.name)
        .and_then(|b| b.factor);
      if let Some(factor) = known {
        mode.factor = Some(factor);
        filled.push(key.clone());
      }
    }
    filled
  }

  pub fn mode(&self, key: &str) -> Result<&ModeSettings, EngineError> {
    self
      .modes
      .get(key)
      .ok_or_else(|| EngineError::UnknownMode(key.to_string()))
  }

  pub fn default_mode(&self) -> Result<&ModeSettings, EngineError> {
    self.mode(&self.default)
  }

  /// Mode keys in selector order (numeric keys first, by value).
  pub fn mode_keys(&self) -> Vec<&str> {
    let mut keys: Vec<&str> = self.modes.keys().map(String::as_str).collect();
    keys.sort_by_key(|k| (k.parse::<u64>().unwrap_or(u64::MAX), k.to_string()));
    keys
  }

  /// Check the document is usable by a form: known default, scaling
  /// metadata consistent with the scheme, patterns that compile.
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.modes.is_empty() {
      return Err(EngineError::validation("modes", "at least one mode is required"));
    }
    self.default_mode()?;
    if self.default_time == 0 {
      return Err(EngineError::validation("default_time", "must be at least 1 minute"));
    }
    InputGate::new("time_regex", &self.time_regex)?;

    for (key, mode) in &self.modes {
      match self.scheme {
        Scheme::Analysis => {
          if mode.unit.is_some() {
            return Err(EngineError::validation(
              &format!("{}.unit", key),
              "unit is not allowed in the analysis scheme",
            ));
          }
          if let Some(f) = mode.factor {
            if !f.is_finite() || f <= 0.0 {
              return Err(EngineError::validation(
                &format!("{}.factor", key),
                "must be a positive number",
              ));
            }
          }
        }
        Scheme::UnitTime => {
          if mode.unit.is_none() {
            return Err(EngineError::validation(
              &format!("{}.unit", key),
              "required in the unit_time scheme",
            ));
          }
          if mode.factor.is_some() {
            return Err(EngineError::validation(
              &format!("{}.factor", key),
              "factor is not allowed in the unit_time scheme",
            ));
          }
        }
      }
      InputGate::new(&format!("{}.regex", key), &mode.regex)?;
    }
    Ok(())
  }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Load/save access to the settings document.
pub trait SettingsRepository {
  fn load(&self) -> Result<SettingsDocument, EngineError>;
  fn save(&self, settings: &SettingsDocument) -> Result<(), EngineError>;
}

/// JSON file on disk. A missing file is created from `defaults`; a file that
/// does not parse is reported as corrupt and left untouched.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
  path: PathBuf,
  defaults: SettingsDocument,
}

impl JsonFileRepository {
  pub fn new(path: impl Into<PathBuf>, defaults: SettingsDocument) -> Self {
    Self {
      path: path.into(),
      defaults,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Write the defaults if the file does not exist yet.
  pub fn ensure_exists(&self) -> Result<bool, EngineError> {
    if self.path.exists() {
      return Ok(false);
    }
    info!("settings: {} missing, writing defaults", self.path.display());
    self.save(&self.defaults)?;
    Ok(true)
  }
}

impl SettingsRepository for JsonFileRepository {
  fn load(&self) -> Result<SettingsDocument, EngineError> {
    self.ensure_exists()?;
    let raw = fs::read_to_string(&self.path).map_err(|e| EngineError::io(&self.path, e))?;
    let mut settings: SettingsDocument =
      serde_json::from_str(&raw).map_err(|source| EngineError::Corrupt {
        path: self.path.clone(),
        source,
      })?;
    let filled = settings.fill_missing_factors();
    if !filled.is_empty() {
      info!("settings: {}: factor taken from built-in analyses for modes {:?}", self.path.display(), filled);
    }
    settings.validate()?;
    debug!("settings: loaded {}", self.path.display());
    Ok(settings)
  }

  fn save(&self, settings: &SettingsDocument) -> Result<(), EngineError> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    settings.serialize(&mut ser)?;
    fs::write(&self.path, buf).map_err(|e| EngineError::io(&self.path, e))?;
    info!("settings: wrote {}", self.path.display());
    Ok(())
  }
}

/// In-memory repository for tests and embedding; never touches the disk.
#[derive(Debug)]
pub struct MemoryRepository {
  settings: RefCell<SettingsDocument>,
  saves: Cell<usize>,
}

impl MemoryRepository {
  pub fn new(settings: SettingsDocument) -> Self {
    Self {
      settings: RefCell::new(settings),
      saves: Cell::new(0),
    }
  }

  /// Current stored document.
  pub fn snapshot(&self) -> SettingsDocument {
    self.settings.borrow().clone()
  }

  /// Number of successful saves so far.
  pub fn save_count(&self) -> usize {
    self.saves.get()
  }
}

impl Default for MemoryRepository {
  fn default() -> Self {
    Self::new(SettingsDocument::analysis_defaults())
  }
}

impl SettingsRepository for MemoryRepository {
  fn load(&self) -> Result<SettingsDocument, EngineError> {
    let mut settings = self.snapshot();
    settings.fill_missing_factors();
    settings.validate()?;
    Ok(settings)
  }

  fn save(&self, settings: &SettingsDocument) -> Result<(), EngineError> {
    *self.settings.borrow_mut() = settings.clone();
    self.saves.set(self.saves.get() + 1);
    Ok(())
  }
}

/// Replace the default mode in the stored document.
pub fn set_default_mode<R: SettingsRepository + ?Sized>(repo: &R, key: &str) -> Result<SettingsDocument, EngineError> {
  let mut settings = repo.load()?;
  settings.mode(key)?;
  settings.default = key.to_string();
  repo.save(&settings)?;
  Ok(settings)
}

/// Replace the default time base (minutes) in the stored document.
pub fn set_default_time<R: SettingsRepository + ?Sized>(repo: &R, minutes: u32) -> Result<SettingsDocument, EngineError> {
  if minutes == 0 {
    return Err(EngineError::validation("time", "must be at least 1 minute"));
  }
  let mut settings = repo.load()?;
  settings.default_time = minutes;
  repo.save(&settings)?;
  Ok(settings)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    SettingsDocument::analysis_defaults().validate().unwrap();
    SettingsDocument::unit_time_defaults().validate().unwrap();
  }

  #[test]
  fn reads_legacy_document_without_new_keys() {
    let json = r#"{
      "default": "1",
      "0": {"analysis": "Alpha-Bêta", "label1": "Coups 1 :", "label2": "Coups 2 :", "regex": "[1-9]\\d*"},
      "1": {"analysis": "Tritium", "label1": "CPMA 1 :", "label2": "CPMA 2 :", "regex": "[1-9]?\\d*((\\.|,){1}\\d{0,2})"}
    }"#;
    let doc: SettingsDocument = serde_json::from_str(json).unwrap();
    assert_eq!(doc.scheme, Scheme::Analysis);
    assert_eq!(doc.default_time, 1);
    assert_eq!(doc.modes.len(), 2);
    assert_eq!(doc.default_mode().unwrap().name, "Tritium");
    assert_eq!(doc.mode("1").unwrap().factor, None);
    doc.validate().unwrap();
  }

  #[test]
  fn legacy_tritium_gets_its_factor_back() {
    let json = r#"{
      "default": "1",
      "0": {"analysis": "Alpha-Bêta", "label1": "Coups 1 :", "label2": "Coups 2 :", "regex": "[1-9]\\d*"},
      "1": {"analysis": "Tritium", "label1": "CPMA 1 :", "label2": "CPMA 2 :", "regex": "[1-9]?\\d*((\\.|,){1}\\d{0,2})"},
      "2": {"analysis": "Radon", "label1": "A :", "label2": "B :", "regex": "[1-9]\\d*"}
    }"#;
    let mut doc: SettingsDocument = serde_json::from_str(json).unwrap();
    let mut filled = doc.fill_missing_factors();
    filled.sort();
    assert_eq!(filled, vec!["0".to_string(), "1".to_string()]);
    assert_eq!(doc.mode("1").unwrap().normalization(1), Normalization::Factor(60.0));
    assert_eq!(doc.mode("0").unwrap().normalization(1), Normalization::Factor(1.0));
    // Unknown analysis keeps raw values.
    assert_eq!(doc.mode("2").unwrap().factor, None);
    assert_eq!(doc.mode("2").unwrap().normalization(1), Normalization::Factor(1.0));
  }

  #[test]
  fn explicit_factor_is_kept() {
    let mut doc = SettingsDocument::analysis_defaults();
    doc.modes.get_mut("1").unwrap().factor = Some(30.0);
    assert!(doc.fill_missing_factors().is_empty());
    assert_eq!(doc.mode("1").unwrap().factor, Some(30.0));
  }

  #[test]
  fn document_keeps_modes_at_top_level() {
    let value = serde_json::to_value(SettingsDocument::analysis_defaults()).unwrap();
    assert_eq!(value["default"], "0");
    assert_eq!(value["1"]["analysis"], "Tritium");
    assert_eq!(value["1"]["factor"], 60.0);
    assert!(value["0"].get("unit").is_none());
  }

  #[test]
  fn unknown_default_is_rejected() {
    let mut doc = SettingsDocument::analysis_defaults();
    doc.default = "7".into();
    assert!(matches!(doc.validate(), Err(EngineError::UnknownMode(k)) if k == "7"));
  }

  #[test]
  fn scheme_mismatch_is_rejected() {
    let mut doc = SettingsDocument::unit_time_defaults();
    doc.scheme = Scheme::Analysis;
    let err = doc.validate().unwrap_err();
    assert!(err.to_string().contains("unit"));

    let mut doc = SettingsDocument::analysis_defaults();
    doc.scheme = Scheme::UnitTime;
    assert!(doc.validate().is_err());
  }

  #[test]
  fn mode_keys_sort_numerically() {
    let mut doc = SettingsDocument::unit_time_defaults();
    let extra = doc.mode("2").unwrap().clone();
    doc.modes.insert("10".into(), extra);
    assert_eq!(doc.mode_keys(), vec!["0", "1", "2", "10"]);
  }

  #[test]
  fn scheme_from_str() {
    assert_eq!("analysis".parse::<Scheme>().unwrap(), Scheme::Analysis);
    assert_eq!("UNIT_TIME".parse::<Scheme>().unwrap(), Scheme::UnitTime);
    assert!("other".parse::<Scheme>().is_err());
  }

  #[test]
  fn memory_repository_round_trip_of_defaults() {
    let repo = MemoryRepository::default();
    let doc = set_default_mode(&repo, "1").unwrap();
    assert_eq!(doc.default, "1");
    assert_eq!(repo.snapshot().default, "1");
    assert_eq!(repo.save_count(), 1);

    set_default_time(&repo, 15).unwrap();
    assert_eq!(repo.snapshot().default_time, 15);
    assert!(set_default_time(&repo, 0).is_err());
    assert!(matches!(set_default_mode(&repo, "9"), Err(EngineError::UnknownMode(_))));
    assert_eq!(repo.save_count(), 2);
  }

  #[test]
  fn file_repository_heals_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let repo = JsonFileRepository::new(&path, SettingsDocument::analysis_defaults());

    let doc = repo.load().unwrap();
    assert!(path.exists());
    assert_eq!(doc, SettingsDocument::analysis_defaults());
    assert!(!repo.ensure_exists().unwrap());

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\n    \"default\": \"0\""), "4-space indent expected:\n{}", raw);
  }

  #[test]
  fn file_repository_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();
    let repo = JsonFileRepository::new(&path, SettingsDocument::analysis_defaults());

    assert!(matches!(repo.load(), Err(EngineError::Corrupt { .. })));
    // Left untouched.
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
  }

  #[test]
  fn file_repository_persists_default_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let repo = JsonFileRepository::new(&path, SettingsDocument::unit_time_defaults());

    set_default_mode(&repo, "2").unwrap();
    set_default_time(&repo, 30).unwrap();

    let reopened = JsonFileRepository::new(&path, SettingsDocument::analysis_defaults());
    let doc = reopened.load().unwrap();
    assert_eq!(doc.scheme, Scheme::UnitTime);
    assert_eq!(doc.default, "2");
    assert_eq!(doc.default_time, 30);
  }
}
