//! Count Deviation Engine — statistical compatibility of two count measurements.
//!
//! Normalizes the two entered counts (decimal separator, analysis factor or
//! unit/time base), computes `|c1 - c2| / (2 * sqrt(c1 + c2))` and classifies
//! it as no data, compatible (<= 1) or incompatible.
//!
//! The form state machine is UI-agnostic; settings come from an injected
//! repository so the whole pipeline runs without touching the filesystem.

pub mod calculation;
pub mod config;
pub mod error;
pub mod form;
pub mod normalize;
pub mod settings;
pub mod types;
pub mod validation;
pub mod verdict;

pub use calculation::{deviation, normalised_deviation};
pub use config::Config;
pub use error::EngineError;
pub use form::Form;
pub use settings::{JsonFileRepository, MemoryRepository, SettingsDocument, SettingsRepository};
pub use types::{Counts, FormView, InboundAction};
pub use verdict::Verdict;
