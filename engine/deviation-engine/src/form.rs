//! The comparison form: field texts, selected mode and verdict, re-evaluated
//! synchronously after every edit.

use log::{debug, warn};

use crate::calculation;
use crate::config::Config;
use crate::error::EngineError;
use crate::normalize::{self, fix_leading_separator};
use crate::settings::{self, ModeSettings, Scheme, SettingsDocument, SettingsRepository};
use crate::types::*;
use crate::validation::InputGate;
use crate::verdict::Verdict;

/// Long-lived form state. Every accepted edit recomputes the verdict before
/// returning; nothing runs in the background.
pub struct Form<R: SettingsRepository> {
  config: Config,
  repo: R,
  settings: SettingsDocument,
  mode_key: String,
  mode: ModeSettings,
  gate: InputGate,
  time_gate: InputGate,
  count1: String,
  count2: String,
  time: String,
  deviation: Option<f64>,
  verdict: Verdict,
}

impl Form<settings::MemoryRepository> {
  /// Analysis defaults, in memory, default config.
  pub fn with_defaults() -> Result<Self, EngineError> {
    Self::open(settings::MemoryRepository::default(), Config::default())
  }
}

impl<R: SettingsRepository> Form<R> {
  /// Load the settings and start on the stored default mode with empty counts.
  pub fn open(repo: R, config: Config) -> Result<Self, EngineError> {
    let settings = repo.load()?;
    let mode_key = settings.default.clone();
    let mode = settings.mode(&mode_key)?.clone();
    let gate = InputGate::new("regex", &mode.regex)?;
    let time_gate = InputGate::new("time_regex", &settings.time_regex)?;
    let time = settings.default_time.to_string();

    Ok(Self {
      config,
      repo,
      settings,
      mode_key,
      mode,
      gate,
      time_gate,
      count1: String::new(),
      count2: String::new(),
      time,
      deviation: None,
      verdict: Verdict::NoData,
    })
  }

  pub fn verdict(&self) -> Verdict {
    self.verdict
  }

  pub fn deviation(&self) -> Option<f64> {
    self.deviation
  }

  pub fn mode_key(&self) -> &str {
    &self.mode_key
  }

  pub fn settings(&self) -> &SettingsDocument {
    &self.settings
  }

  pub fn repository(&self) -> &R {
    &self.repo
  }

  pub fn text(&self, field: Field) -> &str {
    match field {
      Field::Count1 => &self.count1,
      Field::Count2 => &self.count2,
      Field::Time => &self.time,
    }
  }

  /// Edit one field. Text the gate refuses leaves the field as it was and
  /// comes back as a validation error naming the field.
  pub fn set_field(&mut self, field: Field, text: &str) -> Result<Verdict, EngineError> {
    let text = match field {
      Field::Count1 | Field::Count2 => fix_leading_separator(text),
      Field::Time => {
        if self.settings.scheme != Scheme::UnitTime {
          return Err(EngineError::validation("time", "no time base in the analysis scheme"));
        }
        text.to_string()
      }
    };

    let gate = match field {
      Field::Time => &self.time_gate,
      Field::Count1 | Field::Count2 => &self.gate,
    };
    if !gate.accepts(&text) {
      warn!("form: rejected {} input {:?} (pattern {})", field.name(), text, gate.pattern());
      return Err(EngineError::validation(
        field.name(),
        &format!("{:?} does not match {}", text, gate.pattern()),
      ));
    }

    if field == Field::Time && !text.is_empty() {
      if let Ok(minutes) = normalize::parse_time("time", &text) {
        if minutes != self.settings.default_time {
          self.settings = settings::set_default_time(&self.repo, minutes)?;
        }
      }
    }

    match field {
      Field::Count1 => self.count1 = text,
      Field::Count2 => self.count2 = text,
      Field::Time => self.time = text,
    }
    Ok(self.evaluate())
  }

  /// Switch mode: persist it as the default, drop both counts and the verdict,
  /// and take over the new mode's labels and pattern.
  /// Re-selecting the active mode changes nothing.
  pub fn select_mode(&mut self, key: &str) -> Result<Verdict, EngineError> {
    if key == self.mode_key {
      return Ok(self.verdict);
    }
    let mode = self.settings.mode(key)?.clone();
    let gate = InputGate::new(&format!("{}.regex", key), &mode.regex)?;
    self.settings = settings::set_default_mode(&self.repo, key)?;

    self.mode_key = key.to_string();
    self.mode = mode;
    self.gate = gate;
    self.count1.clear();
    self.count2.clear();
    self.deviation = None;
    self.verdict = Verdict::NoData;
    debug!("form: mode {} ({})", self.mode_key, self.mode.name);
    Ok(self.verdict)
  }

  /// Empty both count fields.
  pub fn clear(&mut self) -> Verdict {
    self.count1.clear();
    self.count2.clear();
    self.evaluate()
  }

  pub fn apply(&mut self, action: &InboundAction) -> Result<FormView, EngineError> {
    match action {
      InboundAction::SetCount1 { value } => {
        self.set_field(Field::Count1, value)?;
      }
      InboundAction::SetCount2 { value } => {
        self.set_field(Field::Count2, value)?;
      }
      InboundAction::SetTime { value } => {
        self.set_field(Field::Time, value)?;
      }
      InboundAction::SelectMode { mode } => {
        self.select_mode(mode)?;
      }
      InboundAction::Clear => {
        self.clear();
      }
      InboundAction::View => {}
    }
    Ok(self.view())
  }

  pub fn view(&self) -> FormView {
    let modes = self
      .settings
      .mode_keys()
      .into_iter()
      .filter_map(|key| {
        self.settings.modes.get(key).map(|m| ModeOption {
          key: key.to_string(),
          name: m.name.clone(),
        })
      })
      .collect();

    FormView {
      scheme: self.settings.scheme,
      mode: self.mode_key.clone(),
      mode_name: self.mode.name.clone(),
      modes,
      label1: self.mode.label1.clone(),
      label2: self.mode.label2.clone(),
      count1: self.count1.clone(),
      count2: self.count2.clone(),
      time: self.mode.uses_time().then(|| self.time.clone()),
      verdict: self.verdict,
      result_text: self.verdict.text().to_string(),
      result_color: self.verdict.color().map(str::to_string),
      deviation: self.deviation,
    }
  }

  /// Required fields present: both counts, and the time when the mode scales by it.
  fn is_filled(&self) -> bool {
    !self.count1.is_empty()
      && !self.count2.is_empty()
      && (!self.mode.uses_time() || !self.time.is_empty())
  }

  fn evaluate(&mut self) -> Verdict {
    self.deviation = if self.is_filled() {
      self.compute()
    } else {
      None
    };
    self.verdict = Verdict::classify(self.deviation, self.config.threshold);
    debug!(
      "form: {:?} / {:?} ({}) -> {:?} {:?}",
      self.count1, self.count2, self.mode.name, self.deviation, self.verdict
    );
    self.verdict
  }

  fn compute(&self) -> Option<f64> {
    let time = if self.mode.uses_time() {
      match normalize::parse_time("time", &self.time) {
        Ok(t) => t,
        Err(e) => {
          warn!("form: {}", e);
          return None;
        }
      }
    } else {
      self.settings.default_time
    };

    match normalize::to_counts(&self.count1, &self.count2, &self.mode.normalization(time)) {
      Ok(counts) => calculation::deviation(counts),
      Err(e) => {
        warn!("form: {}", e);
        None
      }
    }
  }
}
