use std::sync::Arc;

use logstorm_core::runner::{LoadConfig, LoadController, Report, RunSignal, ThinkTime};

use crate::catalog_yaml;
use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output::{self, OutputFormatter, OutputOptions};
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let catalog = catalog_yaml::resolve_catalog(args.scenarios.as_deref()).await?;
    let cfg = load_config(&args)?;

    let out = output::formatter(
        args.output,
        OutputOptions {
            quiet: args.quiet,
            show_progress: !args.no_progress,
        },
    );

    let mut controller = LoadController::new(cfg, catalog)?;
    if let Some(f) = out.outcomes() {
        controller = controller.with_outcome_fn(f);
    }
    if let Some(p) = out.progress(controller.config().duration) {
        controller = controller.with_progress(p);
    }

    out.print_header(controller.config(), controller.catalog());

    let watcher = tokio::spawn(watch_interrupts(controller.signal(), out.clone()));
    let res = controller.run().await;
    watcher.abort();

    let stats = res?;
    out.print_summary(&Report::from_stats(&stats))
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}

fn load_config(args: &RunArgs) -> Result<LoadConfig, RunError> {
    let think_time = ThinkTime::new(args.think_min, args.think_max)?;

    Ok(LoadConfig {
        base_url: args.url.clone(),
        users: args.users,
        duration: (!args.duration.is_zero()).then_some(args.duration),
        think_time,
        request_timeout: args.timeout,
        probe_timeout: args.probe_timeout,
        seed: args.seed,
        ..LoadConfig::default()
    })
}

/// First Ctrl+C stops the run; later ones are only logged.
async fn watch_interrupts(signal: RunSignal, out: Arc<dyn OutputFormatter>) {
    loop {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "cannot listen for Ctrl+C");
            return;
        }

        if signal.stop() {
            tracing::info!("interrupt received; stopping virtual users");
            out.print_interrupted();
        } else {
            tracing::warn!("interrupt received again; already stopping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser as _;
    use std::time::Duration;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["logstorm", "run"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv) {
            Ok(Cli {
                command: Command::Run(args),
            }) => args,
            Ok(_) => panic!("expected run command"),
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    #[test]
    fn zero_duration_runs_until_interrupted() {
        let cfg = load_config(&run_args(&["--duration", "0"])).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.duration, None);

        let cfg = load_config(&run_args(&["--duration", "45s"])).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.duration, Some(Duration::from_secs(45)));
    }

    #[test]
    fn inverted_think_time_is_invalid_input() {
        let err = load_config(&run_args(&["--think-min", "3", "--think-max", "1"]))
            .err()
            .unwrap_or_else(|| panic!("expected an error"));
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
    }

    #[test]
    fn flags_flow_into_config() {
        let cfg = load_config(&run_args(&[
            "--url",
            "http://10.0.0.1:8080",
            "--users",
            "3",
            "--timeout",
            "2s",
            "--seed",
            "11",
        ]))
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.base_url, "http://10.0.0.1:8080");
        assert_eq!(cfg.users, 3);
        assert_eq!(cfg.request_timeout, Duration::from_secs(2));
        assert_eq!(cfg.seed, Some(11));
        assert_eq!(cfg.probe_path, "/health");
    }
}
