use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::Error;
use crate::prose::{LintReport, LintRun, Linter};

/// Runs the Vale prose linter.
#[derive(Debug, Clone)]
pub struct Vale {
    program: PathBuf,
    /// `--config` file, CI mode only.
    config: Option<PathBuf>,
    /// Request JSON output and parse it into a [`LintReport`].
    json: bool,
}

impl Vale {
    /// Human-readable output straight to the terminal, using Vale's own config lookup.
    pub fn interactive() -> Self {
        Self {
            program: PathBuf::from("vale"),
            config: None,
            json: false,
        }
    }

    /// JSON output with an explicit config, parsed into a report.
    pub fn ci(config: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("vale"),
            config: Some(config.into()),
            json: true,
        }
    }

    /// Use a different executable (default: `vale` on `PATH`).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.json {
            cmd.args(["--output", "JSON"]);
        }
        if let Some(config) = &self.config {
            cmd.arg("--config").arg(config);
        }
        cmd.arg(dir);
        cmd
    }
}

impl Linter for Vale {
    fn lint(&self, dir: &Path) -> Result<LintRun, Error> {
        let mut cmd = self.command(dir);
        debug!(?cmd, "running linter");
        let spawn_err = |e: std::io::Error| Error::Linter {
            reason: format!("failed to run {}: {e}", self.program.display()),
        };

        if !self.json {
            let status = cmd.status().map_err(spawn_err)?;
            return Ok(LintRun {
                exit_code: status.code().unwrap_or(1),
                report: None,
            });
        }

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(spawn_err)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = LintReport::parse(&stdout)?;
        Ok(LintRun {
            exit_code: output.status.code().unwrap_or(1),
            report: Some(report),
        })
    }
}
