use std::time::{Duration, UNIX_EPOCH};

use serde::Serialize;

use super::stats::RunStats;

/// Sample at index `min(floor(n * p), n - 1)` of an ascending slice.
pub fn percentile(sorted: &[Duration], p: f64) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Share<K> {
    pub key: K,
    pub count: u64,
    pub pct: f64,
}

/// Response-time statistics in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LatencySummary {
    pub samples: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let sum: f64 = sorted.iter().map(Duration::as_secs_f64).sum();
        let mean = sum / sorted.len() as f64;

        Some(Self {
            samples: sorted.len(),
            min_ms: ms(min),
            max_ms: ms(max),
            mean_ms: mean * 1000.0,
            p50_ms: ms(percentile(&sorted, 0.50)?),
            p95_ms: ms(percentile(&sorted, 0.95)?),
            p99_ms: ms(percentile(&sorted, 0.99)?),
        })
    }
}

/// Summary derived from a [`RunStats`] snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub started_at_unix_ms: u64,
    pub elapsed_secs: f64,
    pub total_requests: u64,
    pub success_count: u64,
    pub success_pct: f64,
    pub error_count: u64,
    pub error_pct: f64,
    pub requests_per_sec: f64,
    pub status_codes: Vec<Share<u16>>,
    pub error_kinds: Vec<Share<String>>,
    pub scenarios: Vec<Share<String>>,
    /// `None` when no request succeeded.
    pub latency: Option<LatencySummary>,
}

impl Report {
    pub fn from_stats(stats: &RunStats) -> Self {
        let total = stats.total_requests;
        let elapsed_secs = stats.elapsed.as_secs_f64();
        let requests_per_sec = if elapsed_secs > 0.0 {
            total as f64 / elapsed_secs
        } else {
            0.0
        };

        let started_at_unix_ms = stats
            .started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let mut scenarios: Vec<Share<String>> = stats
            .scenario_counts
            .iter()
            .map(|(name, count)| share(name.to_string(), *count, total))
            .collect();
        scenarios.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        Self {
            started_at_unix_ms,
            elapsed_secs,
            total_requests: total,
            success_count: stats.success_count,
            success_pct: pct(stats.success_count, total),
            error_count: stats.error_count,
            error_pct: pct(stats.error_count, total),
            requests_per_sec,
            status_codes: stats
                .status_code_counts
                .iter()
                .map(|(code, count)| share(*code, *count, total))
                .collect(),
            error_kinds: stats
                .error_kind_counts
                .iter()
                .map(|(kind, count)| share(kind.to_string(), *count, total))
                .collect(),
            scenarios,
            latency: LatencySummary::from_samples(&stats.response_times),
        }
    }
}

fn share<K>(key: K, count: u64, total: u64) -> Share<K> {
    Share {
        key,
        count,
        pct: pct(count, total),
    }
}

fn pct(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64) * 100.0 / (total as f64)
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::runner::StatsAggregator;
    use crate::{ErrorKind, OutcomeKind, RequestOutcome};
    use std::sync::Arc;

    fn millis(v: &[u64]) -> Vec<Duration> {
        v.iter().map(|ms| Duration::from_millis(*ms)).collect()
    }

    #[test]
    fn percentile_indexes_floor_of_n_times_p() {
        let sorted = millis(&(1..=10).collect::<Vec<_>>());
        assert_eq!(percentile(&sorted, 0.50), Some(Duration::from_millis(6)));
        assert_eq!(percentile(&sorted, 0.95), Some(Duration::from_millis(10)));
        assert_eq!(percentile(&sorted, 0.99), Some(Duration::from_millis(10)));
        assert_eq!(percentile(&sorted, 0.0), Some(Duration::from_millis(1)));
        assert_eq!(percentile(&sorted, 1.0), Some(Duration::from_millis(10)));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn latency_summary_sorts_samples() {
        let summary = LatencySummary::from_samples(&millis(&[30, 10, 20, 40])).unwrap();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.min_ms, 10.0);
        assert_eq!(summary.max_ms, 40.0);
        assert!((summary.mean_ms - 25.0).abs() < 1e-9);
        assert_eq!(summary.p50_ms, 30.0);
        assert_eq!(summary.p99_ms, 40.0);
    }

    #[test]
    fn percentiles_are_monotonic() {
        let mut state = 0x2545_f491_u64;
        for n in 1..200usize {
            let samples: Vec<Duration> = (0..n)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    Duration::from_micros(state % 1_000_000)
                })
                .collect();
            let s = LatencySummary::from_samples(&samples).unwrap();
            assert!(s.min_ms <= s.p50_ms);
            assert!(s.p50_ms <= s.p95_ms);
            assert!(s.p95_ms <= s.p99_ms);
            assert!(s.p99_ms <= s.max_ms);
        }
    }

    #[test]
    fn empty_samples_have_no_latency() {
        assert!(LatencySummary::from_samples(&[]).is_none());

        let report = Report::from_stats(&RunStats::empty());
        assert!(report.latency.is_none());
        assert_eq!(report.success_pct, 0.0);
        assert_eq!(report.requests_per_sec, 0.0);
    }

    #[test]
    fn report_breaks_down_codes_and_errors() {
        let stats = StatsAggregator::new();
        let outcome = |kind| RequestOutcome {
            scenario: Arc::from("s"),
            method: http::Method::GET,
            url: "http://127.0.0.1/s".to_string(),
            elapsed: Duration::from_millis(2),
            kind,
        };
        stats.record(outcome(OutcomeKind::Received { status: 404 }));
        stats.record(outcome(OutcomeKind::Received { status: 200 }));
        stats.record(outcome(OutcomeKind::Received { status: 200 }));
        stats.record(outcome(OutcomeKind::Failed {
            kind: ErrorKind::Timeout,
            message: "timed out".to_string(),
        }));

        let report = Report::from_stats(&stats.snapshot());
        assert_eq!(report.total_requests, 4);
        assert_eq!(report.success_pct, 75.0);
        assert_eq!(report.error_pct, 25.0);

        let codes: Vec<(u16, u64)> = report
            .status_codes
            .iter()
            .map(|s| (s.key, s.count))
            .collect();
        assert_eq!(codes, vec![(200, 2), (404, 1)]);
        assert_eq!(report.status_codes[0].pct, 50.0);
        assert_eq!(report.error_kinds[0].key, "timeout");
        assert_eq!(report.scenarios[0].count, 4);
        assert_eq!(report.latency.unwrap().samples, 3);
    }
}
