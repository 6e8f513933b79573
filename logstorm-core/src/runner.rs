mod config;
mod controller;
mod progress;
mod report;
mod signal;
mod stats;
mod vu;

pub use config::{LoadConfig, ThinkTime};
pub use controller::LoadController;
pub use progress::{OutcomeFn, ProgressFn, ProgressUpdate};
pub use report::{LatencySummary, Report, Share, percentile};
pub use signal::RunSignal;
pub use stats::{RunStats, StatsAggregator};
pub use vu::{StopReason, VirtualUser, VuReport};
