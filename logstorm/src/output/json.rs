use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use logstorm_core::runner::{LoadConfig, OutcomeFn, ProgressFn, ProgressUpdate, Report};
use logstorm_core::{ErrorKind, RequestOutcome, ScenarioCatalog};

use super::{OutputFormatter, OutputOptions};

pub(crate) struct JsonOutput {
    opts: OutputOptions,
}

impl JsonOutput {
    pub(crate) fn new(opts: OutputOptions) -> Self {
        Self { opts }
    }
}

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _cfg: &LoadConfig, _catalog: &ScenarioCatalog) {}

    fn outcomes(&self) -> Option<OutcomeFn> {
        if self.opts.quiet {
            return None;
        }
        Some(Arc::new(|o: &RequestOutcome| emit_json_line(&build_request_line(o))))
    }

    fn progress(&self, _duration: Option<Duration>) -> Option<ProgressFn> {
        if !self.opts.show_progress {
            return None;
        }
        Some(Arc::new(|u: ProgressUpdate| emit_json_line(&build_progress_line(&u))))
    }

    fn print_interrupted(&self) {}

    fn print_summary(&self, report: &Report) -> anyhow::Result<()> {
        emit_json_line(&JsonSummaryLine {
            kind: "summary",
            report,
        });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRequestLine<'a> {
    pub kind: &'static str,
    pub scenario: &'a str,
    pub method: &'a str,
    pub url: &'a str,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

fn build_request_line(o: &RequestOutcome) -> JsonRequestLine<'_> {
    JsonRequestLine {
        kind: "request",
        scenario: &o.scenario,
        method: o.method.as_str(),
        url: &o.url,
        elapsed_ms: o.elapsed.as_secs_f64() * 1000.0,
        status: o.status(),
        error_kind: o.error_kind(),
        error: o.error_message(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub active_users: u64,
    pub requests_per_sec: f64,
    pub total_requests: u64,
    pub success_total: u64,
    pub errors_total: u64,
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        elapsed_secs: u.elapsed.as_secs_f64(),
        active_users: u.active_users,
        requests_per_sec: u.rps_now,
        total_requests: u.requests_total,
        success_total: u.success_total,
        errors_total: u.errors_total,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    #[serde(flatten)]
    pub report: &'a Report,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
