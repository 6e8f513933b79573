mod catalog_yaml;
mod cli;
mod exit_codes;
mod logging;
mod output;
mod run;
mod run_error;
mod scenarios;

use clap::Parser;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    exit_codes::ExitCode::Success.as_i32()
                }
                _ => exit_codes::ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    let res = match cli.command {
        cli::Command::Run(args) => {
            logging::init(&args.log_level);
            run::run(args).await
        }
        cli::Command::Scenarios(args) => {
            logging::init("warn");
            scenarios::scenarios(args).await
        }
    };

    let code = match res {
        Ok(code) => code.as_i32(),
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}
