use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nbclean::error::describe;
use nbclean::prose::style::fetch_style;
use nbclean::prose::vale::Vale;
use nbclean::prose::{LintConfig, Linter, extract_all};

/// Extract the markdown from listed notebooks and lint it with Vale.
///
/// Notebooks are read from ./notebooks as listed in
/// ./scripts/notebook_paths.txt; their prose is written under ./scripts/temp.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Run the pull-request checks: download the styleguide, print one line
    /// per file and fail if any file has too many alerts.
    #[arg(long, visible_alias = "CI")]
    ci: bool,
}

fn fail(context: &str, err: nbclean::Error) -> ExitCode {
    eprintln!("error: {context}: {}", describe(&err));
    ExitCode::from(1)
}

fn run_ci(config: &LintConfig, dir: &std::path::Path) -> Result<i32, ExitCode> {
    let style_dir = config.style_dir();
    println!(
        "Downloading styleguide from {} to {}",
        config.style_url,
        style_dir.display()
    );
    fetch_style(&config.style_url, &style_dir).map_err(|e| fail("styleguide", e))?;

    let run = Vale::ci(&config.vale_config)
        .lint(dir)
        .map_err(|e| fail("vale", e))?;
    let report = run.report.unwrap_or_default();
    let max = config.max_warnings;

    if let Some(file) = report.first_over(max) {
        println!(
            "Too many prose warnings or errors in '{}' ({}/{max})",
            file.path, file.alerts
        );
        return Err(ExitCode::from(1));
    }
    for file in &report.files {
        println!("{:<68} {:>7}", file.path, format!("({}/{max})", file.alerts));
    }
    Ok(run.exit_code)
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    let started = Instant::now();
    let config = LintConfig::default();

    let dir = extract_all(&config).map_err(|e| fail("extracting prose", e))?;

    let exit_code = if cli.ci {
        run_ci(&config, &dir)?
    } else {
        Vale::interactive()
            .lint(&dir)
            .map_err(|e| fail("vale", e))?
            .exit_code
    };

    println!(
        "Prose linting took {:.2}s",
        started.elapsed().as_secs_f64()
    );
    Ok(ExitCode::from(u8::try_from(exit_code).unwrap_or(1)))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(code) => code,
    }
}
