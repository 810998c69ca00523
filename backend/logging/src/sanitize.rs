//! Log Sanitising
//!
//! User text goes into log lines verbatim otherwise. Control and zero-width
//! characters are escaped so a line cannot be forged or hidden, and long
//! inputs are cut short.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Longest user text kept in a log line, in characters.
pub const MAX_LOGGED_CHARS: usize = 200;

static UNPRINTABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}\u{200B}-\u{200D}\u{2060}\u{FEFF}]").expect("unprintable char regex"));

/// Escape unprintable characters as `\u{..}` and truncate to
/// [`MAX_LOGGED_CHARS`], marking the cut with `…`.
pub fn sanitize_for_log(input: &str) -> String {
    let (cut, truncated) = match input.char_indices().nth(MAX_LOGGED_CHARS) {
        Some((idx, _)) => (&input[..idx], true),
        None => (input, false),
    };

    let mut clean = UNPRINTABLE_RE
        .replace_all(cut, |caps: &Captures| {
            caps[0].chars().map(|c| format!("\\u{{{:04x}}}", c as u32)).collect::<String>()
        })
        .into_owned();

    if truncated {
        clean.push('…');
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(sanitize_for_log("award 500 <@42>"), "award 500 <@42>");
    }

    #[test]
    fn escapes_control_and_zero_width() {
        assert_eq!(sanitize_for_log("a\nb"), "a\\u{000a}b");
        assert_eq!(sanitize_for_log("x\u{200B}y"), "x\\u{200b}y");
        assert_eq!(sanitize_for_log("\u{FEFF}"), "\\u{feff}");
    }

    #[test]
    fn truncates_long_input() {
        let long = "é".repeat(MAX_LOGGED_CHARS + 50);
        let clean = sanitize_for_log(&long);
        assert!(clean.ends_with('…'));
        assert_eq!(clean.chars().count(), MAX_LOGGED_CHARS + 1);
    }
}
