use std::sync::Arc;
use std::time::Duration;

use crate::outcome::RequestOutcome;

/// Live totals, emitted once per progress interval while the run is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub tick: u64,
    pub elapsed: Duration,
    pub active_users: u64,
    pub requests_total: u64,
    pub success_total: u64,
    pub errors_total: u64,
    /// Requests/sec observed during the last interval.
    pub rps_now: f64,
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

/// Called by a virtual user for every outcome, before it is recorded.
pub type OutcomeFn = Arc<dyn Fn(&RequestOutcome) + Send + Sync + 'static>;
