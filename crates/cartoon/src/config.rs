//! Application configuration from CLI flags and environment.

use std::time::Duration;

use clap::Parser;

use cartoon_core::constants::{
    DEFAULT_CAPACITY, DEFAULT_MAX_FIRES, MAX_CAPACITY, MAX_FIRE_SPREAD, MAX_TIME_UNIT,
};
use cartoon_core::options::Options;

/// Run a pool of self-rescheduling cartoons and tear it down cleanly.
#[derive(Parser, Debug)]
#[command(name = "cartoon", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Number of cartoons in the pool.
    #[arg(
        short = 'n',
        long,
        default_value_t = DEFAULT_CAPACITY,
        env = "CARTOON_CAPACITY",
        value_parser = parse_capacity
    )]
    pub capacity: usize,

    /// Spread of the fire budget; each cartoon reschedules 5 to 5+K-1 times.
    #[arg(
        short = 'k',
        long,
        default_value_t = DEFAULT_MAX_FIRES,
        env = "CARTOON_MAX_FIRES",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FIRE_SPREAD))
    )]
    pub max_fires: u32,

    /// Length of one delay unit, at most 1h (e.g., "1s", "10ms").
    #[arg(long, default_value = "1s", value_parser = parse_time_unit)]
    pub time_unit: Duration,

    /// Stop waiting after this long (e.g., "30m", "1h").
    #[arg(long, default_value = "30m", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Always draw the smallest budget and delay.
    #[arg(long)]
    pub deterministic: bool,

    /// Print one row per cartoon in the report.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (only print "retired/stopped").
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Pool options described by the flags. Not yet validated.
    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            capacity: self.capacity,
            max_fires: self.max_fires,
            time_unit: self.time_unit,
        }
    }
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    let n: usize = s.trim().parse().map_err(|e| format!("{e}"))?;
    if n == 0 || n > MAX_CAPACITY {
        return Err(format!("must be between 1 and {MAX_CAPACITY}"));
    }
    Ok(n)
}

fn parse_time_unit(s: &str) -> Result<Duration, String> {
    let unit = parse_duration_arg(s)?;
    if unit > MAX_TIME_UNIT {
        return Err(format!("must be at most {}s", MAX_TIME_UNIT.as_secs()));
    }
    Ok(unit)
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    match parse_duration(s) {
        Some(d) if !d.is_zero() => Ok(d),
        Some(_) => Err("must be non-zero".to_string()),
        None => Err(format!("invalid duration '{s}' (expected e.g. 500ms, 30s, 5m, 1h)")),
    }
}

/// Parse a duration string like "5m", "1h", "30s", "500ms".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}
