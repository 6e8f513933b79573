use std::sync::Arc;
use std::time::Duration;

use logstorm_core::runner::{LoadConfig, OutcomeFn, ProgressFn, Report};
use logstorm_core::{RequestOutcome, ScenarioCatalog};

mod format;
mod progress;
mod summary;

use format::{format_duration, format_ms, format_rate};
use progress::HumanProgress;
use summary::render;

use super::{OutputFormatter, OutputOptions};

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
    quiet: bool,
    show_progress: bool,
}

impl HumanReadableOutput {
    pub(crate) fn new(opts: OutputOptions) -> Self {
        Self {
            progress: Arc::new(HumanProgress::new(opts.show_progress)),
            quiet: opts.quiet,
            show_progress: opts.show_progress,
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &LoadConfig, catalog: &ScenarioCatalog) {
        println!("target: {}", cfg.base_url);
        println!("users: {}", cfg.users);
        match cfg.duration {
            Some(d) => println!("duration: {}", format_duration(d)),
            None => println!("duration: until interrupted (Ctrl+C)"),
        }
        println!(
            "think time: {}..{}",
            format_duration(cfg.think_time.min),
            format_duration(cfg.think_time.max)
        );
        println!("scenarios: {}", catalog.len());
        println!();
    }

    fn outcomes(&self) -> Option<OutcomeFn> {
        if self.quiet {
            return None;
        }
        let progress = self.progress.clone();
        Some(Arc::new(move |o: &RequestOutcome| progress.println(&request_line(o))))
    }

    fn progress(&self, total_duration: Option<Duration>) -> Option<ProgressFn> {
        if !self.show_progress {
            return None;
        }
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let message = format!(
                "elapsed={} users={} requests={} errors={} rps={}",
                format_duration(u.elapsed),
                u.active_users,
                u.requests_total,
                u.errors_total,
                format_rate(u.rps_now)
            );
            progress.update(total_duration, u.elapsed, message);
        }))
    }

    fn print_interrupted(&self) {
        self.progress
            .println("interrupt received, waiting for in-flight requests...");
    }

    fn print_summary(&self, report: &Report) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(report));
        Ok(())
    }
}

fn request_line(o: &RequestOutcome) -> String {
    let ts = humantime::format_rfc3339_millis(std::time::SystemTime::now());
    let elapsed_ms = o.elapsed.as_secs_f64() * 1000.0;
    match (o.status(), o.error_message()) {
        (Some(status), _) => format!(
            "[{ts}] {status} {} {} {} {}",
            o.scenario,
            format_ms(elapsed_ms),
            o.method,
            o.url
        ),
        (None, msg) => format!(
            "[{ts}] ERROR {} {} {} {}: {}",
            o.scenario,
            o.error_kind().map(|k| k.to_string()).unwrap_or_default(),
            o.method,
            o.url,
            msg.unwrap_or_default()
        ),
    }
}
