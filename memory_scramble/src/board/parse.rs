//! Parsing of the textual board format.
//!
//! UTF-8 text: the first non-blank line is `<rows>x<cols>` with positive
//! integers, followed by exactly `rows * cols` non-empty card labels, one
//! per non-blank line, row-major. Blank and whitespace-only lines are
//! ignored everywhere. Anything else is a parse error.

use super::errors::SetupError;

fn parse_err(line: usize, reason: impl Into<String>) -> SetupError {
    SetupError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Parses board text into `(rows, cols, labels)`.
pub(crate) fn parse(text: &str) -> Result<(usize, usize, Vec<String>), SetupError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| parse_err(1, "missing <rows>x<cols> header"))?;
    let (rows, cols) = header
        .split_once('x')
        .ok_or_else(|| parse_err(header_line, "expected <rows>x<cols>"))?;
    let rows: usize = rows
        .trim()
        .parse()
        .map_err(|_| parse_err(header_line, format!("bad row count {rows:?}")))?;
    let cols: usize = cols
        .trim()
        .parse()
        .map_err(|_| parse_err(header_line, format!("bad column count {cols:?}")))?;
    if rows == 0 || cols == 0 {
        return Err(parse_err(header_line, "dimensions must be positive"));
    }

    let expected = rows * cols;
    let mut labels = Vec::with_capacity(expected);
    let mut last_line = header_line;
    for (n, label) in lines {
        if label.chars().any(char::is_whitespace) {
            return Err(parse_err(n, format!("label {label:?} contains whitespace")));
        }
        if labels.len() == expected {
            return Err(parse_err(n, format!("more than {expected} card labels")));
        }
        labels.push(label.to_string());
        last_line = n;
    }
    if labels.len() != expected {
        return Err(parse_err(
            last_line,
            format!("expected {expected} card labels, found {}", labels.len()),
        ));
    }
    Ok((rows, cols, labels))
}
