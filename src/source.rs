use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::Error;

/// Where changed files and their diffs come from.
///
/// The normalizer only needs text; implementations decide how to produce it.
pub trait DiffSource {
    /// Files that differ between `base` and the working tree, deletions excluded.
    fn changed_files(&self, base: &str) -> Result<Vec<PathBuf>, Error>;

    /// Zero-context unified diff of `path` against `base`.
    fn diff(&self, base: &str, path: &Path) -> Result<String, Error>;
}

/// [`DiffSource`] backed by the `git` command line.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    /// Repository working directory. Empty means the current directory.
    repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    fn git<I, S>(&self, args: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new("git");
        if !self.repo.as_os_str().is_empty() {
            cmd.current_dir(&self.repo);
        }
        cmd.args(args);
        debug!(?cmd, "running git");

        let output = cmd.output().map_err(|e| Error::DiffSource {
            reason: format!("failed to run git: {e}"),
        })?;
        if !output.status.success() {
            return Err(Error::DiffSource {
                reason: format!(
                    "git exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        String::from_utf8(output.stdout).map_err(|e| Error::DiffSource {
            reason: format!("git output is not UTF-8: {e}"),
        })
    }
}

impl DiffSource for GitCli {
    fn changed_files(&self, base: &str) -> Result<Vec<PathBuf>, Error> {
        // NUL-terminated names are never quoted or escaped, whatever core.quotePath says.
        let out = self.git([
            "diff",
            "--name-only",
            "-z",
            "--relative",
            "--diff-filter=d",
            base,
        ])?;
        Ok(out
            .split('\0')
            .filter(|name| !name.is_empty())
            .map(|name| self.repo.join(name))
            .collect())
    }

    fn diff(&self, base: &str, path: &Path) -> Result<String, Error> {
        let relative = path.strip_prefix(&self.repo).unwrap_or(path);
        self.git([
            OsStr::new("diff"),
            OsStr::new("--no-color"),
            OsStr::new("--unified=0"),
            OsStr::new(base),
            OsStr::new("--"),
            relative.as_os_str(),
        ])
    }
}
