use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Error;
use crate::normalize::{Mode, Normalizer, Outcome, Status};
use crate::source::DiffSource;

/// Summary of a run over every changed notebook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Notebooks that were normalized or checked, in order.
    pub processed: Vec<PathBuf>,
    /// Notebooks whose diff could not be classified.
    pub unsupported: Vec<PathBuf>,
    /// The notebook that stopped a check run.
    pub needs_fix: Option<PathBuf>,
}

impl BatchReport {
    /// Overall status: needs-fix wins over unsupported, which wins over clean.
    pub fn status(&self) -> Status {
        if self.needs_fix.is_some() {
            Status::NeedsFix
        } else if !self.unsupported.is_empty() {
            Status::UnsupportedShape
        } else {
            Status::Clean
        }
    }
}

/// Normalize every changed notebook, one at a time.
///
/// `on_file` sees each outcome as soon as the file is done. Unsupported files
/// are recorded and the run moves on; the first file that needs fixing in
/// check mode ends the run.
pub fn run_batch<F>(
    normalizer: &Normalizer,
    source: &dyn DiffSource,
    mode: Mode,
    mut on_file: F,
) -> Result<BatchReport, Error>
where
    F: FnMut(&Path, &Outcome),
{
    let upstream = normalizer.config().upstream.as_str();
    let files = source.changed_files(upstream)?;
    let mut report = BatchReport::default();

    for path in files.iter().filter(|p| normalizer.is_notebook(p)) {
        let diff = source.diff(upstream, path)?;
        let outcome = normalizer.run(path, &diff, mode)?;
        on_file(path, &outcome);
        report.processed.push(path.clone());

        match outcome.status {
            Status::Clean => {}
            Status::UnsupportedShape => {
                warn!(path = %path.display(), "unsupported diff shape");
                report.unsupported.push(path.clone());
            }
            Status::NeedsFix => {
                info!(path = %path.display(), "normalization required, stopping");
                report.needs_fix = Some(path.clone());
                break;
            }
        }
    }

    Ok(report)
}
