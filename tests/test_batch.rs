mod common;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use common::fixture;
use nbclean::{DiffSource, Error, Mode, Normalizer, NormalizerConfig, Status, run_batch};
use tempfile::TempDir;

/// In-memory diff source: a fixed file list and one diff per file.
struct FakeSource {
    files: Vec<PathBuf>,
    diffs: HashMap<PathBuf, String>,
    bases: RefCell<Vec<String>>,
}

impl DiffSource for FakeSource {
    fn changed_files(&self, base: &str) -> Result<Vec<PathBuf>, Error> {
        self.bases.borrow_mut().push(base.to_string());
        Ok(self.files.clone())
    }

    fn diff(&self, _base: &str, path: &Path) -> Result<String, Error> {
        Ok(self.diffs.get(path).cloned().unwrap_or_default())
    }
}

const UNSUPPORTED_DIFF: &str = "@@ -32 +31,0 @@\n-       \"  <clipPath id=\\\"p0a1b2c3\\\">\\n\",\n";

/// Three notebooks and a README: `a` is pure noise, `b` has an unsupported
/// diff, `c` is already clean.
fn workspace() -> (TempDir, FakeSource) {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    let mut diffs = HashMap::new();

    for (name, diff) in [
        ("a.ipynb", fixture("plot.diff")),
        ("b.ipynb", UNSUPPORTED_DIFF.to_string()),
        ("c.ipynb", String::new()),
    ] {
        let path = dir.path().join(name);
        let content = if name == "c.ipynb" {
            fixture("expected_plot.ipynb")
        } else {
            fixture("plot.ipynb")
        };
        std::fs::write(&path, content).unwrap();
        diffs.insert(path.clone(), diff);
        files.push(path);
    }
    let readme = dir.path().join("README.md");
    std::fs::write(&readme, "not a notebook").unwrap();
    files.insert(1, readme);

    let source = FakeSource {
        files,
        diffs,
        bases: RefCell::new(Vec::new()),
    };
    (dir, source)
}

#[test]
fn test_batch_fix_continues_past_unsupported() {
    let (dir, source) = workspace();
    let normalizer = Normalizer::default();
    let mut seen = Vec::new();

    let report = run_batch(&normalizer, &source, Mode::Fix, |path, outcome| {
        seen.push((path.file_name().unwrap().to_owned(), outcome.status));
    })
    .unwrap();

    assert_eq!(seen.len(), 3);
    assert_eq!(report.processed.len(), 3);
    assert_eq!(report.unsupported, vec![dir.path().join("b.ipynb")]);
    assert_eq!(report.status(), Status::UnsupportedShape);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.ipynb")).unwrap(),
        fixture("expected_plot.ipynb")
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
        "not a notebook"
    );
}

#[test]
fn test_batch_check_stops_at_first_needs_fix() {
    let (dir, source) = workspace();
    let normalizer = Normalizer::default();
    let mut visited = 0;

    let report = run_batch(&normalizer, &source, Mode::Check, |_, _| visited += 1).unwrap();

    assert_eq!(visited, 1);
    assert_eq!(report.needs_fix, Some(dir.path().join("a.ipynb")));
    assert_eq!(report.status(), Status::NeedsFix);
    assert_eq!(report.status().code(), 2);
    // Nothing was written.
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.ipynb")).unwrap(),
        fixture("plot.ipynb")
    );
}

#[test]
fn test_batch_uses_configured_upstream() {
    let (_dir, source) = workspace();
    let normalizer = Normalizer::new(NormalizerConfig {
        upstream: "upstream/stable".to_string(),
        ..Default::default()
    });

    run_batch(&normalizer, &source, Mode::Check, |_, _| {}).unwrap();
    assert_eq!(*source.bases.borrow(), vec!["upstream/stable".to_string()]);
}

#[test]
fn test_batch_clean_when_nothing_changed() {
    let source = FakeSource {
        files: Vec::new(),
        diffs: HashMap::new(),
        bases: RefCell::new(Vec::new()),
    };
    let report = run_batch(&Normalizer::default(), &source, Mode::Check, |_, _| {}).unwrap();
    assert!(report.processed.is_empty());
    assert_eq!(report.status(), Status::Clean);
}
