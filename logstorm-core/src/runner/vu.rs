use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;

use super::config::ThinkTime;
use super::progress::OutcomeFn;
use super::signal::RunSignal;
use super::stats::StatsAggregator;
use crate::{RequestExecutor, ScenarioSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    Signal,
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VuReport {
    pub id: u64,
    /// Requests issued by this user; diagnostics only.
    pub requests: u64,
    pub stop: StopReason,
}

/// One simulated client: select, execute, record, think, repeat.
pub struct VirtualUser {
    id: u64,
    selector: ScenarioSelector,
    executor: RequestExecutor,
    stats: Arc<StatsAggregator>,
    signal: RunSignal,
    think_time: ThinkTime,
    deadline: Option<Instant>,
    rng: StdRng,
    on_outcome: Option<OutcomeFn>,
    active: Option<Arc<AtomicU64>>,
}

struct ActiveGuard(Arc<AtomicU64>);

impl ActiveGuard {
    fn enter(counter: Arc<AtomicU64>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl VirtualUser {
    pub fn new(
        id: u64,
        selector: ScenarioSelector,
        executor: RequestExecutor,
        stats: Arc<StatsAggregator>,
        signal: RunSignal,
    ) -> Self {
        Self {
            id,
            selector,
            executor,
            stats,
            signal,
            think_time: ThinkTime::default(),
            deadline: None,
            rng: StdRng::from_os_rng(),
            on_outcome: None,
            active: None,
        }
    }

    pub fn with_think_time(mut self, think_time: ThinkTime) -> Self {
        self.think_time = think_time;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_outcome_fn(mut self, f: Option<OutcomeFn>) -> Self {
        self.on_outcome = f;
        self
    }

    pub fn with_active_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.active = Some(counter);
        self
    }

    pub async fn run(mut self) -> VuReport {
        let _active = self.active.take().map(ActiveGuard::enter);
        let mut requests = 0u64;

        tracing::debug!(vu = self.id, "vu started");

        let stop = loop {
            if self.signal.is_stopped() {
                break StopReason::Signal;
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                break StopReason::Deadline;
            }

            let scenario = self.selector.select(&mut self.rng);
            let outcome = self.executor.execute(scenario, &mut self.rng).await;
            requests += 1;

            // A panicking callback takes this user down before its outcome is recorded.
            if let Some(f) = &self.on_outcome {
                f(&outcome);
            }
            self.stats.record(outcome);

            let mut pause = self.think_time.sample(&mut self.rng);
            if let Some(deadline) = self.deadline {
                pause = pause.min(deadline.saturating_duration_since(Instant::now()));
            }
            if !pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = self.signal.stopped() => {}
                }
            }
        };

        tracing::debug!(vu = self.id, requests, reason = %stop, "vu finished");

        VuReport {
            id: self.id,
            requests,
            stop,
        }
    }
}
