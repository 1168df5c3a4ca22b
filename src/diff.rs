//! Line model for `git diff` style unified diffs.
//!
//! Only as much of the format is understood as the classifier needs: which
//! lines were added or removed, and where added lines sit in the working file.

/// What a single line of unified-diff output represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    /// `diff --git`, `index`, `---` and `+++` lines before a hunk.
    FileHeader,
    /// `@@ -a,b +c,d @@`
    Hunk,
    Removed,
    Added,
    Context,
    /// `\ No newline at end of file`
    Marker,
}

/// One line of a unified diff with its marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine<'a> {
    pub kind: DiffLineKind,
    /// Line text without the leading `+`, `-` or space.
    pub text: &'a str,
    /// 1-based line number in the working file. Set for added and context lines.
    pub new_line: Option<usize>,
}

impl DiffLine<'_> {
    /// Whether this line is part of the change itself (added or removed).
    pub fn is_change(&self) -> bool {
        matches!(self.kind, DiffLineKind::Added | DiffLineKind::Removed)
    }
}

/// Split diff output into tagged lines.
///
/// Lines are split on `\n` only, so a `\r` belonging to the file content stays
/// in `text` and still matches the file verbatim.
pub fn parse_diff(diff: &str) -> Vec<DiffLine<'_>> {
    let mut lines = Vec::new();
    let mut in_hunk = false;
    let mut next_new: Option<usize> = None;

    for raw in diff.split_terminator('\n') {
        if raw.starts_with("@@") {
            in_hunk = true;
            next_new = parse_hunk_new_start(raw);
            lines.push(DiffLine {
                kind: DiffLineKind::Hunk,
                text: raw,
                new_line: None,
            });
            continue;
        }

        if !in_hunk || raw.starts_with("diff ") {
            in_hunk = false;
            lines.push(DiffLine {
                kind: DiffLineKind::FileHeader,
                text: raw,
                new_line: None,
            });
            continue;
        }

        let line = match raw.as_bytes().first() {
            Some(b'+') => DiffLine {
                kind: DiffLineKind::Added,
                text: &raw[1..],
                new_line: advance(&mut next_new),
            },
            Some(b'-') => DiffLine {
                kind: DiffLineKind::Removed,
                text: &raw[1..],
                new_line: None,
            },
            Some(b'\\') => DiffLine {
                kind: DiffLineKind::Marker,
                text: raw,
                new_line: None,
            },
            Some(b' ') => DiffLine {
                kind: DiffLineKind::Context,
                text: &raw[1..],
                new_line: advance(&mut next_new),
            },
            // Some tools emit empty context lines without the leading space.
            _ => DiffLine {
                kind: DiffLineKind::Context,
                text: raw,
                new_line: advance(&mut next_new),
            },
        };
        lines.push(line);
    }

    lines
}

fn advance(next: &mut Option<usize>) -> Option<usize> {
    let current = *next;
    if let Some(n) = next.as_mut() {
        *n += 1;
    }
    current
}

/// Extract `c` from `@@ -a,b +c,d @@`.
fn parse_hunk_new_start(header: &str) -> Option<usize> {
    let plus = header.find(" +")?;
    let rest = &header[plus + 2..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "diff --git a/nb.ipynb b/nb.ipynb\n\
index 1111111..2222222 100644\n\
--- a/nb.ipynb\n\
+++ b/nb.ipynb\n\
@@ -10 +10 @@\n\
-    \"execution_count\": 4,\n\
+    \"execution_count\": 7,\n\
@@ -20,2 +20,0 @@\n\
-gone one\n\
-gone two\n\
@@ -30,0 +29,2 @@\n\
+new one\n\
+new two\n";

    #[test]
    fn test_diff_headers_before_first_hunk() {
        let lines = parse_diff(SAMPLE);
        assert!(
            lines[..4]
                .iter()
                .all(|l| l.kind == DiffLineKind::FileHeader)
        );
        assert_eq!(lines[4].kind, DiffLineKind::Hunk);
    }

    #[test]
    fn test_diff_marker_stripped() {
        let lines = parse_diff(SAMPLE);
        assert_eq!(lines[5].kind, DiffLineKind::Removed);
        assert_eq!(lines[5].text, "    \"execution_count\": 4,");
        assert_eq!(lines[6].kind, DiffLineKind::Added);
        assert_eq!(lines[6].text, "    \"execution_count\": 7,");
    }

    #[test]
    fn test_diff_added_line_numbers_follow_hunk_header() {
        let lines = parse_diff(SAMPLE);
        let added: Vec<_> = lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Added)
            .map(|l| (l.text, l.new_line))
            .collect();
        assert_eq!(
            added,
            vec![
                ("    \"execution_count\": 7,", Some(10)),
                ("new one", Some(29)),
                ("new two", Some(30)),
            ]
        );
    }

    #[test]
    fn test_diff_removed_lines_have_no_new_line() {
        let lines = parse_diff(SAMPLE);
        assert!(
            lines
                .iter()
                .filter(|l| l.kind == DiffLineKind::Removed)
                .all(|l| l.new_line.is_none())
        );
    }

    #[test]
    fn test_diff_context_lines_advance_counter() {
        let diff = "@@ -1,3 +5,3 @@\n keep\n-old\n+new\n keep\n";
        let lines = parse_diff(diff);
        assert_eq!(lines[1].kind, DiffLineKind::Context);
        assert_eq!(lines[1].new_line, Some(5));
        assert_eq!(lines[3].new_line, Some(6));
        assert_eq!(lines[4].new_line, Some(7));
    }

    #[test]
    fn test_diff_no_newline_marker() {
        let diff = "@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n";
        let lines = parse_diff(diff);
        assert_eq!(lines[2].kind, DiffLineKind::Marker);
        assert_eq!(lines[3].new_line, Some(1));
    }

    #[test]
    fn test_diff_carriage_return_kept() {
        let lines = parse_diff("@@ -1 +1 @@\n-a\r\n+b\r\n");
        assert_eq!(lines[1].text, "a\r");
        assert_eq!(lines[2].text, "b\r");
    }

    #[test]
    fn test_diff_empty_input() {
        assert!(parse_diff("").is_empty());
    }

    #[test]
    fn test_diff_hunk_start_without_count() {
        assert_eq!(parse_hunk_new_start("@@ -3 +4 @@"), Some(4));
        assert_eq!(parse_hunk_new_start("@@ -3,2 +40,5 @@ def f():"), Some(40));
        assert_eq!(parse_hunk_new_start("@@ garbage"), None);
    }
}
