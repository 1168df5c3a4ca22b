use std::path::{Path, PathBuf};

/// Errors that can occur while normalizing or linting notebooks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("{}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read ZIP archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed notebook: {reason}")]
    MalformedNotebook { reason: String },

    #[error("diff source failed: {reason}")]
    DiffSource { reason: String },

    #[error("linter failed: {reason}")]
    Linter { reason: String },

    #[error("download failed: {reason}")]
    Download { reason: String },

    #[error("input too large: {size} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn file(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::File { path, source }
    }
}

/// Render an error with its chain of causes, `outer: inner: ...`.
pub fn describe(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    text
}
