pub mod batch;
pub mod diff;
pub mod error;
pub mod noise;
pub mod normalize;
pub mod prose;
pub mod source;

pub use batch::{BatchReport, run_batch};
pub use error::Error;
pub use noise::{NoisePattern, NoisyPair, PairVerdict, ShapeError};
pub use normalize::{
    Finding, Mode, Normalizer, NormalizerConfig, Outcome, RevertStrategy, Status,
};
pub use source::{DiffSource, GitCli};

use std::path::Path;

/// Normalize one notebook against an already computed diff.
///
/// `diff` is the zero-context unified diff of the working copy against the
/// reference revision, as produced by `git diff --unified=0`.
pub fn normalize_file(
    path: impl AsRef<Path>,
    diff: &str,
    mode: Mode,
    config: NormalizerConfig,
) -> Result<Outcome, Error> {
    Normalizer::new(config).run(path.as_ref(), diff, mode)
}

/// Read a notebook and return the prose of its markdown cells.
pub fn extract_prose_file(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(Error::file(path))?;
    prose::extract_prose(&data)
}
