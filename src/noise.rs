//! Detection of regeneration noise in notebook diffs.
//!
//! Plotting libraries that emit SVG assign fresh identifiers to clip paths
//! every time a figure is rendered. Re-running a notebook therefore produces
//! diff lines that change nothing but those identifiers. The classifier finds
//! those line pairs so the normalizer can put the old identifiers back.

use crate::diff::{DiffLine, DiffLineKind};

/// A recognizable kind of identifier-bearing SVG line.
///
/// Each variant knows how to find its generated identifier, so supporting a new
/// kind of noise means adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoisePattern {
    /// A reference such as `clip-path=\"url(#p8d1c2e)\"`.
    ClipPathUrl,
    /// A definition such as `<clipPath id=\"p8d1c2e\">`.
    ClipPathId,
}

impl NoisePattern {
    pub const ALL: [NoisePattern; 2] = [NoisePattern::ClipPathUrl, NoisePattern::ClipPathId];

    /// Opening tokens paired with the quote token they use.
    ///
    /// SVG stored in a notebook sits inside a JSON string, so quotes are
    /// normally escaped. Bare quotes are accepted as well.
    fn openers(self) -> [(&'static str, &'static str); 2] {
        match self {
            NoisePattern::ClipPathUrl => [
                ("clip-path=\\\"url(#", "\\\""),
                ("clip-path=\"url(#", "\""),
            ],
            NoisePattern::ClipPathId => [
                ("<clipPath id=\\\"", "\\\""),
                ("<clipPath id=\"", "\""),
            ],
        }
    }

    /// The first pattern present in `line`, if any.
    pub fn detect(line: &str) -> Option<NoisePattern> {
        Self::ALL.into_iter().find(|p| p.matches(line))
    }

    pub fn matches(self, line: &str) -> bool {
        self.locate(line).is_some()
    }

    /// Byte offset just past the opening token, and the quote token in use.
    fn locate(self, line: &str) -> Option<(usize, &'static str)> {
        self.openers()
            .into_iter()
            .find_map(|(opener, quote)| line.find(opener).map(|i| (i + opener.len(), quote)))
    }

    /// Split `line` around its generated identifier.
    ///
    /// Returns `None` when the line does not contain this pattern or the
    /// identifier's closing token (`)` or the closing quote) is missing.
    pub fn split(self, line: &str) -> Option<IdentifierSplit<'_>> {
        let (end_of_opener, quote) = self.locate(line)?;
        let (start, close) = match self {
            NoisePattern::ClipPathUrl => {
                // The identifier keeps its leading `#`.
                let start = end_of_opener - 1;
                let close = line[start..].find(')')? + start;
                (start, close)
            }
            NoisePattern::ClipPathId => {
                let close = line[end_of_opener..].find(quote)? + end_of_opener;
                (end_of_opener, close)
            }
        };
        Some(IdentifierSplit {
            prefix: &line[..start],
            identifier: &line[start..close],
            suffix: &line[close..],
        })
    }
}

/// A line cut into the text around a generated identifier and the identifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierSplit<'a> {
    pub prefix: &'a str,
    pub identifier: &'a str,
    pub suffix: &'a str,
}

impl<'a> IdentifierSplit<'a> {
    /// The line with its identifier removed. Two lines with equal keys have the same shape.
    pub fn key(&self) -> (&'a str, &'a str) {
        (self.prefix, self.suffix)
    }
}

/// How the two lines of a [`NoisyPair`] relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairVerdict {
    /// Only the generated identifier changed. The change should be reverted.
    IdentifierOnly,
    /// The lines are byte-identical; nothing to revert.
    Identical,
    /// Something other than the identifier changed; the diff is real content.
    ContentChanged,
}

/// A removed line directly followed by an added line of the same noise pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoisyPair<'a> {
    pub pattern: NoisePattern,
    /// Text of the removed (reference revision) line.
    pub before: &'a str,
    /// Text of the added (working copy) line.
    pub after: &'a str,
    /// 1-based line number of `after` in the working file, if the diff reported one.
    pub after_line: Option<usize>,
}

impl NoisyPair<'_> {
    pub fn verdict(&self) -> PairVerdict {
        if self.before == self.after {
            return PairVerdict::Identical;
        }
        match (self.pattern.split(self.before), self.pattern.split(self.after)) {
            (Some(b), Some(a)) if b.key() == a.key() => PairVerdict::IdentifierOnly,
            _ => PairVerdict::ContentChanged,
        }
    }
}

/// The diff contains a noise-pattern line the classifier cannot pair up.
///
/// Files with this shape need a human to look at them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized diff shape at diff line {line}: {reason}")]
pub struct ShapeError {
    /// 1-based position in the diff output.
    pub line: usize,
    pub text: String,
    pub reason: &'static str,
}

impl ShapeError {
    fn new(index: usize, text: &str, reason: &'static str) -> Self {
        Self {
            line: index + 1,
            text: text.to_string(),
            reason,
        }
    }
}

/// Collect every removed/added pair of noise-pattern lines in a parsed diff.
///
/// Context and header lines are never tested. Any changed line carrying a
/// noise pattern must be a removed line immediately followed by an added line
/// of the same pattern, and both must have a delimited identifier; otherwise
/// the whole diff is rejected.
pub fn classify<'a>(lines: &[DiffLine<'a>]) -> Result<Vec<NoisyPair<'a>>, ShapeError> {
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        let pattern = match NoisePattern::detect(line.text) {
            Some(p) if line.is_change() => p,
            _ => {
                i += 1;
                continue;
            }
        };

        let Some(next) = lines.get(i + 1) else {
            return Err(ShapeError::new(i, line.text, "no counterpart line follows"));
        };
        if line.kind != DiffLineKind::Removed || next.kind != DiffLineKind::Added {
            return Err(ShapeError::new(
                i,
                line.text,
                "expected a removed line followed by an added line",
            ));
        }
        if !pattern.matches(next.text) {
            return Err(ShapeError::new(
                i + 1,
                next.text,
                "counterpart line does not carry the same pattern",
            ));
        }
        if pattern.split(line.text).is_none() {
            return Err(ShapeError::new(i, line.text, "identifier is not terminated"));
        }
        if pattern.split(next.text).is_none() {
            return Err(ShapeError::new(
                i + 1,
                next.text,
                "identifier is not terminated",
            ));
        }

        pairs.push(NoisyPair {
            pattern,
            before: line.text,
            after: next.text,
            after_line: next.new_line,
        });
        i += 2;
    }

    Ok(pairs)
}
