// Helpers for turning TOML parse failures into readable config errors.

use crate::error::BridgeError;

/// Convert a byte offset into a 1-based (line, column) pair within `src`.
#[must_use]
pub fn line_col_at(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let col = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, col)
}

/// Build a `BridgeError::Config` naming the document and, when the parser
/// reported a span, the line and column of the failure.
#[must_use]
pub fn config_parse_error(what: &str, src: &str, err: &toml::de::Error) -> BridgeError {
    let msg = err.message().trim().to_string();
    match err.span() {
        Some(span) => {
            let (line, col) = line_col_at(src, span.start);
            BridgeError::Config(format!("{what} parse error at {line}:{col}: {msg}"))
        }
        None => BridgeError::Config(format!("{what} parse error: {msg}")),
    }
}
