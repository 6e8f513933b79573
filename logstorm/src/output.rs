use std::sync::Arc;
use std::time::Duration;

use logstorm_core::ScenarioCatalog;
use logstorm_core::runner::{LoadConfig, OutcomeFn, ProgressFn, Report};

use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, cfg: &LoadConfig, catalog: &ScenarioCatalog);
    /// Per-request sink; `None` when request lines are suppressed.
    fn outcomes(&self) -> Option<OutcomeFn>;
    fn progress(&self, duration: Option<Duration>) -> Option<ProgressFn>;
    fn print_interrupted(&self);
    fn print_summary(&self, report: &Report) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputOptions {
    pub quiet: bool,
    pub show_progress: bool,
}

pub(crate) fn formatter(format: OutputFormat, opts: OutputOptions) -> Arc<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Arc::new(human::HumanReadableOutput::new(opts)),
        OutputFormat::Json => Arc::new(json::JsonOutput::new(opts)),
    }
}
