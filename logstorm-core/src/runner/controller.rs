use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::{Instant, MissedTickBehavior};

use super::config::LoadConfig;
use super::progress::{OutcomeFn, ProgressFn, ProgressUpdate};
use super::signal::RunSignal;
use super::stats::{RunStats, StatsAggregator};
use super::vu::VirtualUser;
use crate::{Error, RequestExecutor, Result, ScenarioCatalog, ScenarioSelector};

/// Drives a single load run: probe, spawn users, wait, snapshot.
pub struct LoadController {
    config: LoadConfig,
    catalog: Arc<ScenarioCatalog>,
    signal: RunSignal,
    on_outcome: Option<OutcomeFn>,
    on_progress: Option<ProgressFn>,
}

impl LoadController {
    pub fn new(config: LoadConfig, catalog: Arc<ScenarioCatalog>) -> Result<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self {
            config,
            catalog,
            signal: RunSignal::new(),
            on_outcome: None,
            on_progress: None,
        })
    }

    pub fn with_outcome_fn(mut self, f: OutcomeFn) -> Self {
        self.on_outcome = Some(f);
        self
    }

    pub fn with_progress(mut self, f: ProgressFn) -> Self {
        self.on_progress = Some(f);
        self
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Handle for stopping the run from elsewhere (e.g. a Ctrl+C watcher).
    pub fn signal(&self) -> RunSignal {
        self.signal.clone()
    }

    /// Asks every user to stop at its next loop boundary. Returns `true` on the first call only.
    pub fn stop(&self) -> bool {
        self.signal.stop()
    }

    pub async fn run(&self) -> Result<RunStats> {
        self.probe().await?;

        let stats = Arc::new(StatsAggregator::new());
        let active = Arc::new(AtomicU64::new(0));
        let deadline = self.config.duration.map(|d| Instant::now() + d);

        tracing::info!(
            users = self.config.users,
            duration = ?self.config.duration,
            scenarios = self.catalog.len(),
            "starting load run"
        );

        let mut handles = Vec::with_capacity(self.config.users as usize);
        for id in 0..self.config.users {
            let executor =
                RequestExecutor::new(&self.config.base_url, self.config.request_timeout);
            let mut vu = VirtualUser::new(
                id,
                ScenarioSelector::new(self.catalog.clone()),
                executor,
                stats.clone(),
                self.signal.clone(),
            )
            .with_think_time(self.config.think_time)
            .with_deadline(deadline)
            .with_outcome_fn(self.on_outcome.clone())
            .with_active_counter(active.clone());
            if let Some(seed) = self.config.seed {
                vu = vu.with_seed(seed.wrapping_add(id));
            }

            handles.push((id, tokio::spawn(vu.run())));
        }

        let progress_handle = self.on_progress.clone().map(|progress| {
            let stats = stats.clone();
            let active = active.clone();
            let period = self.config.progress_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                let mut tick: u64 = 0;
                let mut last_at = Instant::now();
                let mut last_requests = 0u64;

                loop {
                    interval.tick().await;

                    tick = tick.saturating_add(1);
                    let now = Instant::now();
                    let dt = now.duration_since(last_at);
                    last_at = now;

                    let totals = stats.totals();
                    let delta = totals.requests.saturating_sub(last_requests);
                    last_requests = totals.requests;

                    progress(ProgressUpdate {
                        tick,
                        elapsed: stats.started().elapsed(),
                        active_users: active.load(Ordering::Relaxed),
                        requests_total: totals.requests,
                        success_total: totals.success,
                        errors_total: totals.errors,
                        rps_now: (delta as f64) / dt.as_secs_f64().max(1e-9),
                    });
                }
            })
        });

        for (id, handle) in handles {
            match handle.await {
                Ok(report) => {
                    tracing::trace!(vu = report.id, requests = report.requests, "vu joined");
                }
                Err(err) if err.is_panic() => {
                    tracing::error!(vu = id, "virtual user panicked; its siblings keep running");
                }
                Err(err) => {
                    tracing::warn!(vu = id, error = %err, "virtual user task did not complete");
                }
            }
        }

        if let Some(handle) = progress_handle {
            handle.abort();
            let _ = handle.await;
        }

        let snapshot = stats.snapshot();
        tracing::info!(
            requests = snapshot.total_requests,
            errors = snapshot.error_count,
            elapsed = ?snapshot.elapsed,
            "load run finished"
        );
        Ok(snapshot)
    }

    async fn probe(&self) -> Result<()> {
        let executor = RequestExecutor::new(&self.config.base_url, self.config.probe_timeout);
        let url = executor.url_for(&self.config.probe_path);

        match executor
            .probe(&self.config.probe_path, self.config.probe_timeout)
            .await
        {
            Ok(status) if (200..300).contains(&status) => {
                tracing::debug!(%url, status, "target reachable");
                Ok(())
            }
            Ok(status) => {
                tracing::warn!(%url, status, "probe answered with a non-2xx status; continuing");
                Ok(())
            }
            Err(source) => Err(Error::UnreachableTarget { url, source }),
        }
    }
}
