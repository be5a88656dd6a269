// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Replays a JSON scenario of commands against a fresh engine and reports
//! each outcome.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod scenario;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{Result, eyre::Context};
use enrollment::{Clock, Engine, EngineConfig, FixedClock};
use enrollment_audit::AuditEvent;
use scenario::{Scenario, Summary};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

/// Enrollment - replay enrollment scenarios
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario file (JSON).
    scenario: PathBuf,

    /// IANA timezone that decides the institution's calendar day.
    #[arg(short, long, default_value = "UTC")]
    timezone: String,

    /// Upper bound on pending requests per decanate.
    #[arg(long)]
    max_pending: Option<usize>,

    /// Start the clock at this RFC 3339 instant instead of the wall clock.
    #[arg(long, value_parser = parse_instant)]
    now: Option<OffsetDateTime>,

    /// Stop at the first step whose result differs from its expectation.
    #[arg(long)]
    strict: bool,

    /// Print the audit trail as JSON once the scenario has run.
    #[arg(long)]
    audit: bool,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

fn parse_instant(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    // RUST_LOG wins over the verbosity flags.
    let filter: EnvFilter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(summary) if args.strict && summary.unexpected > 0 => {
            error!(unexpected = summary.unexpected, "Scenario diverged from expectations");
            std::process::exit(1);
        }
        Ok(_) => Ok(()),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Summary> {
    let raw: String = std::fs::read_to_string(&args.scenario)
        .wrap_err_with(|| format!("Failed to read scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse scenario {}", args.scenario.display()))?;

    let config: EngineConfig = EngineConfig::new(&args.timezone, args.max_pending)?;
    let start: Option<OffsetDateTime> = args.now.or_else(|| scenario.first_instant());
    let fixed: Option<Arc<FixedClock>> = start.map(|now| Arc::new(FixedClock::new(now)));
    let engine: Engine = match &fixed {
        Some(clock) => {
            let shared: Arc<dyn Clock> = clock.clone();
            Engine::with_clock(config, shared)
        }
        None => Engine::new(config),
    };

    info!(
        scenario = %args.scenario.display(),
        steps = scenario.steps.len(),
        timezone = %config.timezone,
        "Replaying scenario"
    );
    let summary: Summary = scenario.run(&engine, fixed.as_deref(), args.strict);
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        unexpected = summary.unexpected,
        "Scenario finished"
    );

    if args.audit {
        let trail: Vec<AuditEvent> = engine.audit_trail()?;
        println!("{}", serde_json::to_string_pretty(&trail)?);
    }
    Ok(summary)
}
