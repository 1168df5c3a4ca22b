//! Prose linting: pull the markdown out of notebooks and hand it to a linter.

pub mod extract;
pub mod style;
pub mod vale;

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::Error;

pub use extract::extract_prose;

/// Published styleguide used by CI runs.
pub const DEFAULT_STYLE_URL: &str = "https://github.com/frankharkins/qiskit-textbook-styleguide/releases/download/v0.1-alpha/QiskitTextbook.zip";

/// Paths and limits for a lint run. All paths are relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Where extracted markdown and the style package are written.
    pub temp_dir: PathBuf,
    /// Root the notebook list is relative to.
    pub notebook_root: PathBuf,
    /// File listing notebooks to lint, one per line, without extension.
    pub notebook_list: PathBuf,
    /// Vale configuration used in CI mode.
    pub vale_config: PathBuf,
    pub style_url: String,
    /// A file with more alerts than this fails a CI run.
    pub max_warnings: usize,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("./scripts/temp"),
            notebook_root: PathBuf::from("./notebooks"),
            notebook_list: PathBuf::from("./scripts/notebook_paths.txt"),
            vale_config: PathBuf::from("scripts/vale.ini"),
            style_url: DEFAULT_STYLE_URL.to_string(),
            max_warnings: 20,
        }
    }
}

impl LintConfig {
    /// Directory receiving extracted markdown: the notebook root mirrored under `temp_dir`.
    pub fn prose_dir(&self) -> PathBuf {
        let mut dir = self.temp_dir.clone();
        dir.extend(
            self.notebook_root
                .components()
                .filter(|c| matches!(c, Component::Normal(_))),
        );
        dir
    }

    pub fn style_dir(&self) -> PathBuf {
        self.temp_dir.join("style")
    }
}

/// Entries of a notebook list. Blank lines and `#` comments are skipped.
pub fn parse_notebook_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

/// Extract every listed notebook's prose into [`LintConfig::prose_dir`].
///
/// `<root>/<entry>.ipynb` becomes `<prose_dir>/<entry>.md`. Returns the prose directory.
pub fn extract_all(config: &LintConfig) -> Result<PathBuf, Error> {
    let list = std::fs::read_to_string(&config.notebook_list)
        .map_err(Error::file(&config.notebook_list))?;
    let out_dir = config.prose_dir();

    for entry in parse_notebook_list(&list) {
        let source = config.notebook_root.join(format!("{entry}.ipynb"));
        let target = out_dir.join(format!("{entry}.md"));
        debug!(source = %source.display(), target = %target.display(), "extracting prose");

        let data = std::fs::read(&source).map_err(Error::file(&source))?;
        let prose = extract_prose(&data)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, prose).map_err(Error::file(&target))?;
    }

    info!(dir = %out_dir.display(), "prose extracted");
    Ok(out_dir)
}

/// Alert count for one linted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAlerts {
    pub path: String,
    pub alerts: usize,
}

/// Per-file alert counts from a machine-readable lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub files: Vec<FileAlerts>,
}

impl LintReport {
    /// Parse Vale's JSON output: an object mapping each file to its alert array.
    pub fn parse(json: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|e| Error::Linter {
            reason: format!("invalid JSON report: {e}"),
        })?;
        let map = value.as_object().ok_or(Error::Linter {
            reason: "report is not a JSON object".to_string(),
        })?;
        let files = map
            .iter()
            .map(|(path, alerts)| FileAlerts {
                path: path.clone(),
                alerts: alerts.as_array().map_or(0, Vec::len),
            })
            .collect();
        Ok(Self { files })
    }

    /// The first file with more than `max` alerts.
    pub fn first_over(&self, max: usize) -> Option<&FileAlerts> {
        self.files.iter().find(|f| f.alerts > max)
    }
}

/// Exit code and, for machine-readable runs, the parsed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRun {
    pub exit_code: i32,
    pub report: Option<LintReport>,
}

/// A prose linter run over a directory of markdown files.
pub trait Linter {
    fn lint(&self, dir: &Path) -> Result<LintRun, Error>;
}
