use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::outcome::{ErrorKind, OutcomeKind, RequestOutcome};

/// Point-in-time copy of the run's accumulated statistics.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub status_code_counts: BTreeMap<u16, u64>,
    pub error_kind_counts: BTreeMap<ErrorKind, u64>,
    pub scenario_counts: BTreeMap<Arc<str>, u64>,
    /// One sample per successful request, in recording order.
    pub response_times: Vec<Duration>,
    pub started_at: SystemTime,
    /// Monotonic time between the start of the run and this snapshot.
    pub elapsed: Duration,
}

impl RunStats {
    /// Statistics of a run that never issued a request.
    pub fn empty() -> Self {
        Tally::default().into_stats(SystemTime::now(), Duration::ZERO)
    }
}

#[derive(Debug, Default, Clone)]
struct Tally {
    total: u64,
    success: u64,
    errors: u64,
    status_codes: BTreeMap<u16, u64>,
    error_kinds: BTreeMap<ErrorKind, u64>,
    scenarios: BTreeMap<Arc<str>, u64>,
    response_times: Vec<Duration>,
}

impl Tally {
    fn into_stats(self, started_at: SystemTime, elapsed: Duration) -> RunStats {
        RunStats {
            total_requests: self.total,
            success_count: self.success,
            error_count: self.errors,
            status_code_counts: self.status_codes,
            error_kind_counts: self.error_kinds,
            scenario_counts: self.scenarios,
            response_times: self.response_times,
            started_at,
            elapsed,
        }
    }
}

/// Cheap counters for live progress; no sample copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    pub requests: u64,
    pub success: u64,
    pub errors: u64,
}

/// Run-wide accumulator shared by all virtual users.
///
/// Every `record` updates the whole group under one lock, so each observation sees
/// `success_count + error_count == total_requests` and one timing sample per success.
#[derive(Debug)]
pub struct StatsAggregator {
    started_at: SystemTime,
    started: Instant,
    inner: Mutex<Tally>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
            inner: Mutex::new(Tally::default()),
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn record(&self, outcome: RequestOutcome) {
        let mut t = self.inner.lock();

        t.total += 1;
        *t.scenarios.entry(outcome.scenario).or_insert(0) += 1;

        match outcome.kind {
            OutcomeKind::Received { status } => {
                t.success += 1;
                *t.status_codes.entry(status).or_insert(0) += 1;
                t.response_times.push(outcome.elapsed);
            }
            OutcomeKind::Failed { kind, .. } => {
                t.errors += 1;
                *t.error_kinds.entry(kind).or_insert(0) += 1;
            }
        }
    }

    pub fn snapshot(&self) -> RunStats {
        let t = self.inner.lock().clone();
        t.into_stats(self.started_at, self.started.elapsed())
    }

    pub(crate) fn totals(&self) -> Totals {
        let t = self.inner.lock();
        Totals {
            requests: t.total,
            success: t.success,
            errors: t.errors,
        }
    }
}
