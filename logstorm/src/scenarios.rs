use std::fmt::Write as _;

use logstorm_core::ScenarioCatalog;

use crate::catalog_yaml;
use crate::cli::ScenariosArgs;
use crate::exit_codes::ExitCode;
use crate::run_error::RunError;

pub async fn scenarios(args: ScenariosArgs) -> Result<ExitCode, RunError> {
    let catalog = catalog_yaml::resolve_catalog(args.scenarios.as_deref()).await?;

    if args.yaml {
        let yaml = catalog_yaml::render_yaml(&catalog).map_err(RunError::RuntimeError)?;
        print!("{yaml}");
    } else {
        print!("{}", render_table(&catalog));
    }

    Ok(ExitCode::Success)
}

fn render_table(catalog: &ScenarioCatalog) -> String {
    let mut out = String::new();
    for (s, share) in catalog.shares() {
        writeln!(
            &mut out,
            "{:>6.2}%  {:<6} {:<28} {}",
            share * 100.0,
            s.method.as_str(),
            s.url.to_string(),
            s.name
        )
        .ok();
    }
    writeln!(
        &mut out,
        "{} scenarios, total weight {}",
        catalog.len(),
        catalog.total_weight()
    )
    .ok();
    out
}
