//! File name helpers for labels taken from the schedule page.

/// Turns a label into a file name stem.
///
/// Letters and digits (any script) and `-` are kept, whitespace and `_` runs
/// become a single `_`, everything else is dropped. `None` when nothing is
/// left.
pub fn file_stem(label: &str) -> Option<String> {
    let mut out = String::with_capacity(label.len());
    let mut last_us = false;
    for ch in label.chars() {
        if ch.is_alphanumeric() || ch == '-' {
            out.push(ch);
            last_us = false;
        } else if (ch.is_whitespace() || ch == '_') && !last_us {
            out.push('_');
            last_us = true;
        }
    }

    let stem = out.trim_matches('_');
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Spring 2023").as_deref(), Some("Spring_2023"));
        assert_eq!(file_stem("Fall/Winter  2023 (A)").as_deref(), Some("FallWinter_2023_A"));
        assert_eq!(file_stem("\u{c9}t\u{e9} 2023").as_deref(), Some("\u{c9}t\u{e9}_2023"));
        assert_eq!(file_stem("../.."), None);
    }
}
