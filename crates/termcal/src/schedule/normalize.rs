//! Cell text cleanup.

/// Whitespace as far as schedule cells are concerned, including `&nbsp;`.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{a0}'
}

/// Normalizes a raw cell string.
///
/// Keeps only the first non-empty line, collapses every whitespace run
/// (non-breaking spaces included) into a single space, and trims the ends.
pub fn normalize(raw: &str) -> String {
    let first_line = raw
        .lines()
        .find(|line| !line.trim_matches(is_blank).is_empty())
        .unwrap_or("");

    let mut out = String::with_capacity(first_line.len());
    let mut prev_blank = false;
    for ch in first_line.trim_matches(is_blank).chars() {
        if is_blank(ch) {
            if !prev_blank {
                out.push(' ');
                prev_blank = true;
            }
        } else {
            out.push(ch);
            prev_blank = false;
        }
    }
    out
}

/// True for text nodes that only exist because of markup indentation.
pub(crate) fn is_layout_whitespace(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

/// Decodes an ISO-8859-1 page. Every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
