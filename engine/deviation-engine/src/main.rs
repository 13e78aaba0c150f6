//! Binary entrypoint: read JSON line actions from stdin, write JSON line views to stdout.
//!
//! One view line is written at startup. Then each input line is an
//! InboundAction and produces either:
//! - A FormView (the form after the action)
//! - An ErrorOutput (unparseable line, or an edit the input gate refused)
//!
//! Logs go to stderr (RUST_LOG, default `warn`).

use deviation_engine::types::ErrorOutput;
use deviation_engine::{Config, Form, InboundAction, JsonFileRepository, SettingsDocument};
use std::io::{self, BufRead, Write};

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let config = match Config::from_env() {
    Ok(c) => c,
    Err(e) => {
      let _ = writeln!(io::stderr(), "deviation-engine: config: {}", e);
      std::process::exit(1);
    }
  };

  let repo = JsonFileRepository::new(
    config.settings_path.clone(),
    SettingsDocument::defaults_for(config.scheme),
  );
  let settings_path = repo.path().to_path_buf();
  let mut form = match Form::open(repo, config) {
    Ok(f) => f,
    Err(e) => {
      let _ = writeln!(
        io::stderr(),
        "deviation-engine: settings {}: {}",
        settings_path.display(),
        e
      );
      std::process::exit(1);
    }
  };

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::LineWriter::new(stdout.lock());

  let _ = serde_json::to_writer(&mut out, &form.view());
  let _ = writeln!(out);

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "deviation-engine: read error: {}", e);
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let action: InboundAction = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    match form.apply(&action) {
      Ok(view) => {
        let _ = serde_json::to_writer(&mut out, &view);
        let _ = writeln!(out);
      }
      Err(e) => {
        let err = match e.field() {
          Some(field) => ErrorOutput::new(e.to_string()).with_field(field),
          None => ErrorOutput::new(e.to_string()),
        };
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
      }
    }
  }

  let _ = out.flush();
}
