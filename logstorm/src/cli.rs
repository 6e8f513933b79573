use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const DURATION_HINT: &str = "expected e.g. 10s, 250ms, 1m, 0.5";

pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(format!("duration cannot be empty ({DURATION_HINT})"));
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit() && *ch != '.')
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!("invalid duration '{s}' ({DURATION_HINT})"));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: f64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' ({DURATION_HINT})"))?;

    let scale = match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1e-3,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        _ => return Err(format!("invalid duration '{s}' ({DURATION_HINT})")),
    };

    Duration::try_from_secs_f64(value * scale).map_err(|_| format!("duration '{s}' is too large"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable request log, progress and summary.
    HumanReadable,
    /// Emit NDJSON request, progress and summary lines to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "logstorm",
    author,
    version,
    about = "Synthetic HTTP traffic generator",
    long_about = "logstorm simulates concurrent virtual users that issue weighted, randomized HTTP requests against a target service.\n\nIt is meant for filling logs, warming caches and smoke-testing services under realistic mixed traffic, and prints a latency and status-code report when the run ends.",
    after_help = "Examples:\n  logstorm run --url http://localhost:8000 --users 20 --duration 5m\n  logstorm run --users 5 --duration 0 --quiet\n  logstorm run --scenarios traffic.yaml --output json\n  logstorm scenarios --yaml > traffic.yaml"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate traffic against a target
    #[command(
        long_about = "Probe the target, then run the configured number of virtual users until the duration elapses or Ctrl+C is pressed.\n\nAny HTTP status counts as a completed request; only timeouts and transport failures count as errors."
    )]
    Run(RunArgs),

    /// Show the scenario catalog and selection probabilities
    Scenarios(ScenariosArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target base URL
    #[arg(long, env = "LOGSTORM_URL", default_value = "http://localhost:8000")]
    pub url: String,

    /// Number of concurrent virtual users
    #[arg(long, default_value_t = 20)]
    pub users: u64,

    /// Run duration (e.g. 30s, 5m); 0 runs until interrupted
    #[arg(long, value_parser = parse_duration, default_value = "300s")]
    pub duration: Duration,

    /// Minimum think time between a user's requests
    #[arg(long, value_parser = parse_duration, default_value = "0.5s")]
    pub think_min: Duration,

    /// Maximum think time between a user's requests
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    pub think_max: Duration,

    /// Per-request timeout
    #[arg(long, value_parser = parse_duration, default_value = "10s")]
    pub timeout: Duration,

    /// Timeout of the pre-flight reachability probe
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub probe_timeout: Duration,

    /// Load the scenario catalog from a YAML file instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub scenarios: Option<PathBuf>,

    /// Seed the per-user random generators for reproducible scenario selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Suppress per-request lines
    #[arg(long, short)]
    pub quiet: bool,

    /// Disable the live progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log filter used when RUST_LOG is unset (e.g. info, logstorm_core=debug)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Args)]
pub struct ScenariosArgs {
    /// Catalog file to inspect instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub scenarios: Option<PathBuf>,

    /// Print the catalog as a YAML document that `run --scenarios` accepts
    #[arg(long)]
    pub yaml: bool,
}
