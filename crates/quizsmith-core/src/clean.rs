//! Canonical text cleaning.
//!
//! Every source kind passes its raw text through [`clean`] exactly once,
//! inside [`finalize_source`](crate::source::finalize_source). The output
//! is the single canonical text that chunking, excerpts, and word counts
//! are derived from.
//!
//! Rules:
//!
//! 1. `\r\n` and lone `\r` become `\n`.
//! 2. Control characters other than `\n` and `\t`, and zero-width format
//!    characters, are dropped.
//! 3. Each line is trimmed and internal whitespace runs collapse to a
//!    single space.
//! 4. Runs of blank lines collapse to one paragraph break (`\n\n`), and
//!    leading/trailing blank lines disappear.
//!
//! The function is idempotent: `clean(&clean(x)) == clean(x)`.

/// Normalize raw extracted text into canonical form.
///
/// # Example
///
/// ```rust
/// use quizsmith_core::clean::clean;
///
/// let text = clean("  Hello\u{200B}   world \r\n\r\n\r\n Second\tline ");
/// assert_eq!(text, "Hello world\n\nSecond line");
/// ```
pub fn clean(raw: &str) -> String {
    let normalized = strip_controls(raw);

    let mut result = String::with_capacity(normalized.len());
    let mut prev_was_blank = false;
    let mut first_content = true;

    for line in normalized.split('\n') {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            prev_was_blank = true;
            continue;
        }

        if !first_content {
            if prev_was_blank {
                result.push_str("\n\n");
            } else {
                result.push('\n');
            }
        }
        collapse_internal_whitespace(trimmed, &mut result);
        prev_was_blank = false;
        first_content = false;
    }

    result
}

/// Bounded preview of canonical text.
///
/// Returns the whole text when it fits in `max_chars` characters;
/// otherwise the first `max_chars - 1` characters (trailing whitespace
/// removed) followed by `…`. Always cuts on a `char` boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let prefix: String = text.chars().take(max_chars - 1).collect();
    let mut out = prefix.trim_end().to_string();
    out.push('…');
    out
}

/// Truncate to at most `max_chars` characters, without an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}

fn strip_controls(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' | '\t' => out.push(ch),
            c if c.is_control() || is_zero_width(c) => {}
            c => out.push(c),
        }
    }
    out
}

fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

fn collapse_internal_whitespace(line: &str, out: &mut String) {
    let mut prev_was_space = false;

    for ch in line.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \n\t\r\n "), "");
    }

    #[test]
    fn collapses_whitespace_and_blank_lines() {
        let raw = "\n\n  Title  \n\n\n\nFirst   para\nstill first\n\n\n  Second\u{00A0}\u{00A0}para  \n\n";
        assert_eq!(
            clean(raw),
            "Title\n\nFirst para\nstill first\n\nSecond para"
        );
    }

    #[test]
    fn strips_control_and_zero_width_characters() {
        let raw = "a\u{0007}b\u{FEFF}c\u{200B}d\u{0000}";
        assert_eq!(clean(raw), "abcd");
    }

    #[test]
    fn carriage_returns_become_newlines() {
        assert_eq!(clean("one\rtwo\r\n\r\nthree"), "one\ntwo\n\nthree");
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(raw in any::<String>()) {
            let once = clean(&raw);
            prop_assert_eq!(clean(&once), once);
        }

        #[test]
        fn clean_output_has_no_runs_or_edges(raw in "[ a-z\t\r\n\u{A0}\u{200B}]{0,200}") {
            let out = clean(&raw);
            prop_assert!(!out.contains("\n\n\n"));
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }

    #[test]
    fn excerpt_keeps_short_text_whole() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn excerpt_bounds_long_text_on_char_boundary() {
        let text = "héllo wörld ünïcode";
        let ex = excerpt(text, 8);
        assert!(ex.chars().count() <= 8);
        assert!(ex.ends_with('…'));
        assert!(ex.starts_with("héllo"));
    }

    #[test]
    fn excerpt_zero_is_empty() {
        assert_eq!(excerpt("anything", 0), "");
    }

    #[test]
    fn truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }
}
