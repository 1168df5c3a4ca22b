#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(Path::new("tests/fixtures").join(name)).unwrap()
}

/// Copy a fixture into a fresh temporary directory so tests can rewrite it.
pub fn scratch_copy(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, fixture(name)).unwrap();
    (dir, path)
}

/// Execution counter values in file order.
pub fn counters(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|l| l.trim_start().strip_prefix("\"execution_count\":"))
        .map(|v| v.trim().trim_end_matches(',').to_string())
        .collect()
}

/// Run git in `dir` with a throwaway identity, panicking with its stderr on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let output = std::process::Command::new("git")
        .current_dir(dir)
        .args(["-c", "user.name=nbclean", "-c", "user.email=nbclean@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A fresh repository whose `origin/main` holds `files`, with a clean checkout.
pub fn upstream_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "--quiet"]);
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    git(dir.path(), &["add", "--all"]);
    git(dir.path(), &["commit", "--quiet", "-m", "upstream"]);
    git(dir.path(), &["update-ref", "refs/remotes/origin/main", "HEAD"]);
    dir
}
