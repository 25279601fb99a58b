use std::path::PathBuf;

use chrono::NaiveDate;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use crate::{business_logic::compute_vesting_schedule, shared::errors::Error};

mod business_logic;
mod shared;

#[derive(Debug, StructOpt)]
#[structopt(about = "Compute a cumulative vesting schedule from a CSV of vesting events")]
struct Args {
    /// CSV file with vesting events
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// Cutoff date: only events on or before this date count (YYYY-MM-DD)
    #[structopt(parse(try_from_str = parse_date))]
    target_date: NaiveDate,
    /// Decimal precision for emitted cumulative amounts
    #[structopt(default_value = "2")]
    precision: u32,
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Error> {
    setup_logging();
    let args = Args::from_args();

    let report = compute_vesting_schedule(
        args.input,
        args.target_date,
        args.precision,
        std::io::stdout(),
    )?;

    // Skip diagnostics go to stderr; the schedule itself is on stdout.
    if !report.skipped.is_empty() {
        tracing::warn!("total lines skipped: {}", report.skipped.len());
        for row in &report.skipped {
            tracing::warn!("row {}: {} in {:?}", row.line, row.reason, row.raw);
        }
    }

    Ok(())
}
