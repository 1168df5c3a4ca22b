use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nbclean::error::describe;
use nbclean::{Finding, GitCli, Mode, Normalizer, NormalizerConfig, Outcome, Status};

/// Invalid command-line usage.
const EXIT_USAGE: u8 = 64;
/// git or filesystem failure.
const EXIT_IO: u8 = 74;

/// Revert clip-path id churn and renumber execution counts in changed notebooks.
///
/// Every notebook changed relative to the upstream ref (NBCLEAN_UPSTREAM,
/// default origin/main) is normalized in place.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Only report notebooks that need normalizing; exit 2 if any do.
    #[arg(long)]
    check: bool,
}

fn print_outcome(path: &Path, outcome: &Outcome, mode: Mode) {
    match (outcome.status, mode) {
        (Status::NeedsFix, _) => {
            for finding in &outcome.findings {
                match finding {
                    Finding::IdentifierNoise { before, after } => println!(
                        "Found identical lines with different ids in {}:\n  - {before}\n  + {after}",
                        path.display()
                    ),
                    _ => println!("{}: {finding}", path.display()),
                }
            }
            println!("Run `nbclean` without --check to fix.");
        }
        (Status::UnsupportedShape, Mode::Fix) => {
            println!("Failed to fix {}", path.display());
            print_shape_errors(outcome);
        }
        (Status::UnsupportedShape, Mode::Check) => {
            println!("Unsupported diff shape in {}", path.display());
            print_shape_errors(outcome);
        }
        (Status::Clean, _) => {}
    }
}

fn print_shape_errors(outcome: &Outcome) {
    for finding in &outcome.findings {
        if let Finding::UnrecognizedShape(err) = finding {
            println!("  {err}");
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    let mode = if cli.check { Mode::Check } else { Mode::Fix };
    let normalizer = Normalizer::new(NormalizerConfig::from_env());
    let source = GitCli::default();

    let report = nbclean::run_batch(&normalizer, &source, mode, |path, outcome| {
        print_outcome(path, outcome, mode)
    })
    .map_err(|e| {
        eprintln!("error: {}", describe(&e));
        ExitCode::from(EXIT_IO)
    })?;

    match report.status() {
        Status::Clean => Ok(ExitCode::SUCCESS),
        status => Err(ExitCode::from(status.code())),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli) {
        Ok(code) => code,
        Err(code) => code,
    }
}
