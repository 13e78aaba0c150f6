//! count-compare: fast compatibility check of two counts for scripts
//!
//! Usage:
//!   count-compare <count1> <count2>                    # raw shocks
//!   count-compare <count1> <count2> --factor 60        # analysis multiplier
//!   count-compare <count1> <count2> --unit cps --time 5
//!   count-compare <count1> <count2> -q                 # quiet: exit code only
//!
//! Exit code: 0 compatible, 1 incompatible, 2 no data or bad input.

use std::process;

use anyhow::Context;
use clap::{ArgGroup, Parser, ValueEnum};
use deviation_engine::normalize::{self, Normalization, Unit};
use deviation_engine::verdict::DEFAULT_THRESHOLD;
use deviation_engine::{deviation, Verdict};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "count-compare")]
#[command(about = "Normalized deviation between two counts", long_about = None)]
#[command(group(
    ArgGroup::new("scaling")
        .args(["factor", "unit"])
        .multiple(false)
))]
struct Cli {
    /// First count (`.` or `,` as decimal separator)
    count1: String,
    /// Second count
    count2: String,
    /// Multiply both counts by this factor
    #[arg(long)]
    factor: Option<f64>,
    /// Unit both counts were entered in
    #[arg(long, value_enum)]
    unit: Option<UnitArg>,
    /// Time base in minutes, used with --unit cps|cpm
    #[arg(long, default_value_t = 1)]
    time: u32,
    /// Largest deviation still reported as compatible
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Quiet: only the exit code
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Count,
    Cps,
    Cpm,
}

impl From<UnitArg> for Unit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Count => Unit::Count,
            UnitArg::Cps => Unit::Cps,
            UnitArg::Cpm => Unit::Cpm,
        }
    }
}

#[derive(Serialize)]
struct Report {
    count1: f64,
    count2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    deviation: Option<f64>,
    verdict: Verdict,
}

fn normalization(cli: &Cli) -> anyhow::Result<Normalization> {
    if cli.time == 0 {
        anyhow::bail!("--time must be at least 1 minute");
    }
    Ok(match (cli.factor, cli.unit) {
        (Some(f), _) if !f.is_finite() || f <= 0.0 => anyhow::bail!("--factor must be positive"),
        (Some(f), _) => Normalization::Factor(f),
        (None, Some(unit)) => Normalization::UnitTime {
            unit: unit.into(),
            time: cli.time,
        },
        (None, None) => Normalization::Factor(1.0),
    })
}

fn evaluate(cli: &Cli) -> anyhow::Result<Report> {
    let scaling = normalization(cli)?;
    let counts = normalize::to_counts(&cli.count1, &cli.count2, &scaling)
        .context("invalid count")?;
    let d = deviation(counts);
    Ok(Report {
        count1: counts.count1,
        count2: counts.count2,
        deviation: d,
        verdict: Verdict::classify(d, cli.threshold),
    })
}

fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Compatible => 0,
        Verdict::Incompatible => 1,
        Verdict::NoData => 2,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let report = evaluate(&cli).unwrap_or_else(|e| {
        eprintln!("count-compare: {:#}", e);
        process::exit(2);
    });
    log::debug!("count-compare: {} vs {} -> {:?}", report.count1, report.count2, report.deviation);

    if cli.quiet {
        process::exit(exit_code(report.verdict));
    }

    if cli.json {
        match serde_json::to_string(&report) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("count-compare: {}", e);
                process::exit(2);
            }
        }
    } else {
        match report.deviation {
            Some(d) => println!(
                "{} vs {}: deviation {:.3} -> {}",
                report.count1,
                report.count2,
                d,
                report.verdict.text()
            ),
            None => println!("No data."),
        }
    }

    process::exit(exit_code(report.verdict));
}
