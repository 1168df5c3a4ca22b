use crate::error::Error;

/// Collect the markdown prose of a notebook for linting.
///
/// The sources of all markdown cells are concatenated, each followed by a
/// newline. HTML comment lines are dropped unless they carry a `vale`
/// directive, since those switch linter rules on and off.
pub fn extract_prose(data: &[u8]) -> Result<String, Error> {
    let text = std::str::from_utf8(data).map_err(|e| Error::MalformedNotebook {
        reason: format!("invalid UTF-8: {e}"),
    })?;

    let root: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::MalformedNotebook {
            reason: format!("invalid JSON: {e}"),
        })?;

    let cells = root
        .get("cells")
        .and_then(|v| v.as_array())
        .ok_or(Error::MalformedNotebook {
            reason: "notebook missing \"cells\" array".to_string(),
        })?;

    let mut markdown = String::new();
    for cell in cells {
        if cell.get("cell_type").and_then(|v| v.as_str()) == Some("markdown") {
            markdown.push_str(&join_source(cell.get("source")));
            markdown.push('\n');
        }
    }

    let mut out = String::with_capacity(markdown.len());
    for line in markdown.split('\n') {
        if line.contains("<!--") && !line.contains("vale ") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

/// `source` is either a string or an array of strings.
fn join_source(source: Option<&serde_json::Value>) -> String {
    match source {
        Some(serde_json::Value::Array(parts)) => parts.iter().filter_map(|v| v.as_str()).collect(),
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notebook(cells: &[serde_json::Value]) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": cells
        }))
        .unwrap()
    }

    fn cell(cell_type: &str, source: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "cell_type": cell_type,
            "metadata": {},
            "source": source
        })
    }

    #[test]
    fn test_extract_markdown_cells_only() {
        let data = notebook(&[
            cell("markdown", &["# Title\n", "Intro text"]),
            cell("code", &["print('not prose')"]),
            cell("raw", &["raw stuff"]),
            cell("markdown", &["Closing words"]),
        ]);
        let prose = extract_prose(&data).unwrap();
        assert_eq!(prose, "# Title\nIntro text\nClosing words\n\n");
    }

    #[test]
    fn test_extract_drops_comments() {
        let data = notebook(&[cell(
            "markdown",
            &["Keep me\n", "<!-- reviewer note -->\n", "Me too"],
        )]);
        let prose = extract_prose(&data).unwrap();
        assert!(prose.contains("Keep me"));
        assert!(prose.contains("Me too"));
        assert!(!prose.contains("reviewer note"));
    }

    #[test]
    fn test_extract_keeps_vale_directives() {
        let data = notebook(&[cell(
            "markdown",
            &["<!-- vale off -->\n", "qubit qubits\n", "<!-- vale on -->"],
        )]);
        let prose = extract_prose(&data).unwrap();
        assert!(prose.starts_with("<!-- vale off -->\n"));
        assert!(prose.contains("<!-- vale on -->"));
    }

    #[test]
    fn test_extract_source_as_string() {
        let nb = serde_json::json!({
            "cells": [{ "cell_type": "markdown", "metadata": {}, "source": "Single string" }]
        });
        let prose = extract_prose(&serde_json::to_vec(&nb).unwrap()).unwrap();
        assert_eq!(prose, "Single string\n\n");
    }

    #[test]
    fn test_extract_empty_notebook() {
        let prose = extract_prose(&notebook(&[])).unwrap();
        assert_eq!(prose, "\n");
    }

    #[test]
    fn test_extract_invalid_json() {
        let err = extract_prose(b"{ not json").unwrap_err();
        assert!(matches!(err, Error::MalformedNotebook { .. }));
    }

    #[test]
    fn test_extract_missing_cells() {
        let err = extract_prose(br#"{"metadata": {}}"#).unwrap_err();
        assert!(err.to_string().contains("cells"), "error was: {err}");
    }
}
