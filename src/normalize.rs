//! Notebook normalization: revert identifier noise and renumber execution counters.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::diff::parse_diff;
use crate::error::Error;
use crate::noise::{NoisyPair, PairVerdict, ShapeError, classify};

/// Left-trimmed start of a line holding an execution counter.
const COUNTER_KEY: &str = "\"execution_count\":";

/// Environment variable overriding [`NormalizerConfig::upstream`].
pub const UPSTREAM_ENV: &str = "NBCLEAN_UPSTREAM";

/// Whether the normalizer may touch the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Report what would change, never write.
    Check,
    /// Rewrite the file in place.
    #[default]
    Fix,
}

/// Result of normalizing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing to do, or fix mode completed.
    #[default]
    Clean,
    /// The diff has a noise line the classifier could not pair up.
    UnsupportedShape,
    /// Check mode found noise or out-of-order counters.
    NeedsFix,
}

impl Status {
    /// Process exit code for this status.
    pub fn code(self) -> u8 {
        match self {
            Status::Clean => 0,
            Status::UnsupportedShape => 1,
            Status::NeedsFix => 2,
        }
    }
}

/// How identifier-only changes are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevertStrategy {
    /// Replace every occurrence of the changed line's text anywhere in the file.
    #[default]
    Global,
    /// Replace only the line the diff points at, and only if it still matches.
    LineIndexed,
}

/// Settings for a [`Normalizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Revision the working copy is compared against (default: `origin/main`).
    pub upstream: String,
    /// File extension of notebooks, without the dot (default: `ipynb`).
    pub extension: String,
    pub revert: RevertStrategy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            upstream: "origin/main".to_string(),
            extension: "ipynb".to_string(),
            revert: RevertStrategy::Global,
        }
    }
}

impl NormalizerConfig {
    /// Defaults, with the upstream ref taken from `NBCLEAN_UPSTREAM` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(upstream) = std::env::var(UPSTREAM_ENV)
            && !upstream.trim().is_empty()
        {
            config.upstream = upstream.trim().to_string();
        }
        config
    }
}

/// Something the normalizer noticed in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A line that differs from the reference revision only by a generated identifier.
    IdentifierNoise { before: String, after: String },
    /// An execution counter that is not its position among all counters.
    CounterOutOfOrder {
        /// 1-based line in the notebook file.
        line: usize,
        expected: usize,
        found: String,
    },
    UnrecognizedShape(ShapeError),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::IdentifierNoise { before, after } => write!(
                f,
                "identical lines with different ids:\n  - {before}\n  + {after}"
            ),
            Finding::CounterOutOfOrder {
                line,
                expected,
                found,
            } => write!(
                f,
                "cell execution count in wrong order at line {line}: expected {expected}, found {found}"
            ),
            Finding::UnrecognizedShape(err) => write!(f, "{err}"),
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub status: Status,
    /// In check mode, what needs fixing. In fix mode, what was fixed.
    pub findings: Vec<Finding>,
    /// Whether the file on disk was rewritten.
    pub rewritten: bool,
}

/// Reverts clip-path identifier churn and canonicalizes execution counters.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Whether `path` has the configured notebook extension.
    pub fn is_notebook(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension))
    }

    /// Normalize the notebook at `path` given its diff against the reference revision.
    ///
    /// Check mode never writes. Fix mode writes the file only when its content changed.
    pub fn run(&self, path: &Path, diff: &str, mode: Mode) -> Result<Outcome, Error> {
        let content = std::fs::read_to_string(path).map_err(Error::file(path))?;
        match mode {
            Mode::Check => Ok(self.check(&content, diff)),
            Mode::Fix => {
                let (fixed, mut outcome) = self.fix(&content, diff);
                if fixed != content {
                    std::fs::write(path, &fixed).map_err(Error::file(path))?;
                    outcome.rewritten = true;
                    info!(path = %path.display(), fixes = outcome.findings.len(), "rewrote notebook");
                } else {
                    debug!(path = %path.display(), "notebook already normalized");
                }
                Ok(outcome)
            }
        }
    }

    /// Report whether `content` needs fixing, without changing anything.
    pub fn check(&self, content: &str, diff: &str) -> Outcome {
        let lines = parse_diff(diff);
        let pairs = match classify(&lines) {
            Ok(pairs) => pairs,
            Err(err) => {
                return Outcome {
                    status: Status::UnsupportedShape,
                    findings: vec![Finding::UnrecognizedShape(err)],
                    rewritten: false,
                };
            }
        };

        let mut findings: Vec<Finding> = pairs
            .iter()
            .filter(|p| p.verdict() == PairVerdict::IdentifierOnly)
            .map(|p| Finding::IdentifierNoise {
                before: p.before.to_string(),
                after: p.after.to_string(),
            })
            .collect();
        findings.extend(first_counter_out_of_order(content));

        let status = if findings.is_empty() {
            Status::Clean
        } else {
            Status::NeedsFix
        };
        Outcome {
            status,
            findings,
            rewritten: false,
        }
    }

    /// Produce the normalized text of `content`.
    ///
    /// Identifier noise is reverted first. If the diff cannot be classified no
    /// identifiers are touched and the status is `UnsupportedShape`, but the
    /// counters are still renumbered.
    pub fn fix(&self, content: &str, diff: &str) -> (String, Outcome) {
        let lines = parse_diff(diff);
        let (reverted, mut findings, status) = match classify(&lines) {
            Ok(pairs) => {
                let (text, findings) = self.revert_noise(content, &pairs);
                (text, findings, Status::Clean)
            }
            Err(err) => {
                warn!(%err, "skipping identifier revert");
                (
                    content.to_string(),
                    vec![Finding::UnrecognizedShape(err)],
                    Status::UnsupportedShape,
                )
            }
        };

        let (text, renumbered) = canonicalize_counters(&reverted);
        findings.extend(renumbered);

        let outcome = Outcome {
            status,
            findings,
            rewritten: false,
        };
        (text, outcome)
    }

    fn revert_noise(&self, content: &str, pairs: &[NoisyPair<'_>]) -> (String, Vec<Finding>) {
        let noisy = pairs
            .iter()
            .filter(|p| p.verdict() == PairVerdict::IdentifierOnly);
        let mut findings = Vec::new();

        let text = match self.config.revert {
            RevertStrategy::Global => {
                let mut text = content.to_string();
                for pair in noisy {
                    if text.contains(pair.after) {
                        text = text.replace(pair.after, pair.before);
                        findings.push(noise_finding(pair));
                    }
                }
                text
            }
            RevertStrategy::LineIndexed => {
                let mut lines: Vec<&str> = content.split('\n').collect();
                for pair in noisy {
                    let Some(index) = pair.after_line.and_then(|n| n.checked_sub(1)) else {
                        debug!(after = pair.after, "no line number for noisy line");
                        continue;
                    };
                    if lines.get(index) == Some(&pair.after) {
                        lines[index] = pair.before;
                        findings.push(noise_finding(pair));
                    }
                }
                lines.join("\n")
            }
        };

        (text, findings)
    }
}

fn noise_finding(pair: &NoisyPair<'_>) -> Finding {
    Finding::IdentifierNoise {
        before: pair.before.to_string(),
        after: pair.after.to_string(),
    }
}

/// An execution counter line cut around its value.
struct CounterLine<'a> {
    /// Indentation, key and spacing after the colon.
    head: &'a str,
    value: &'a str,
    /// Trailing comma and anything else after the value.
    tail: &'a str,
}

impl CounterLine<'_> {
    fn parse(line: &str) -> Option<CounterLine<'_>> {
        let trimmed = line.trim_start();
        if !trimmed.starts_with(COUNTER_KEY) {
            return None;
        }
        let key_end = line.len() - trimmed.len() + COUNTER_KEY.len();
        let after_key = &line[key_end..];
        let value_start = key_end + (after_key.len() - after_key.trim_start().len());
        let value_len = line[value_start..]
            .find(|c: char| c == ',' || c.is_whitespace())
            .unwrap_or(line.len() - value_start);
        let value_end = value_start + value_len;
        Some(CounterLine {
            head: &line[..value_start],
            value: &line[value_start..value_end],
            tail: &line[value_end..],
        })
    }

    fn is(&self, expected: usize) -> bool {
        self.value.parse::<usize>() == Ok(expected)
    }
}

/// The first counter whose value is not its 1-based position among all counters.
pub fn first_counter_out_of_order(content: &str) -> Option<Finding> {
    content
        .split('\n')
        .enumerate()
        .filter_map(|(i, line)| CounterLine::parse(line).map(|c| (i, c)))
        .enumerate()
        .find(|(rank, (_, counter))| !counter.is(rank + 1))
        .map(|(rank, (i, counter))| Finding::CounterOutOfOrder {
            line: i + 1,
            expected: rank + 1,
            found: counter.value.to_string(),
        })
}

/// Renumber every execution counter to 1, 2, 3, ... in file order.
///
/// Formatting around each value is kept. Returns the new text and one
/// finding per counter that changed.
pub fn canonicalize_counters(content: &str) -> (String, Vec<Finding>) {
    let mut expected = 1;
    let mut findings = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for (i, line) in content.split('\n').enumerate() {
        match CounterLine::parse(line) {
            Some(counter) => {
                if counter.is(expected) {
                    out.push(line.to_string());
                } else {
                    findings.push(Finding::CounterOutOfOrder {
                        line: i + 1,
                        expected,
                        found: counter.value.to_string(),
                    });
                    out.push(format!("{}{}{}", counter.head, expected, counter.tail));
                }
                expected += 1;
            }
            None => out.push(line.to_string()),
        }
    }

    (out.join("\n"), findings)
}
