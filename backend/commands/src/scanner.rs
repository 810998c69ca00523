//! Token scanner: splits a command line into whitespace-separated tokens.
//!
//! A double-quoted span is one token with the quotes removed and its inner
//! whitespace preserved. An unterminated quote runs to the end of the input.
//! Empty tokens (`""`) are skipped, so the scanner never yields an empty
//! string. Scanning cannot fail.

use std::ops::Range;

/// One lexical token: a view into the scanned input plus its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    text: &'a str,
    start: usize,
    quoted: bool,
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Byte range of the token text (quotes excluded) within the input.
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }

    /// Whether the token came from a double-quoted span.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }
}

impl AsRef<str> for Token<'_> {
    fn as_ref(&self) -> &str {
        self.text
    }
}

/// Lazy token iterator. Cheap to clone: a clone taken before iterating walks
/// the same tokens again.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

/// Scan `input` into tokens.
pub fn scan(input: &str) -> Scanner<'_> {
    Scanner { input, pos: 0 }
}

impl<'a> Scanner<'a> {
    /// The unconsumed tail of the input, leading whitespace removed.
    pub fn rest(&self) -> &'a str {
        self.input[self.pos..].trim_start()
    }

    fn skip_blanks(&mut self) {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn take_quoted(&mut self) -> Token<'a> {
        // Opening quote is one byte.
        let start = self.pos + 1;
        match self.input[start..].find('"') {
            Some(offset) => {
                self.pos = start + offset + 1;
                Token { text: &self.input[start..start + offset], start, quoted: true }
            }
            None => {
                self.pos = self.input.len();
                Token { text: &self.input[start..], start, quoted: true }
            }
        }
    }

    fn take_bare(&mut self) -> Token<'a> {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos = start + len;
        Token { text: &rest[..len], start, quoted: false }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            self.skip_blanks();
            if self.pos >= self.input.len() {
                return None;
            }
            let token = if self.input[self.pos..].starts_with('"') {
                self.take_quoted()
            } else {
                self.take_bare()
            };
            if !token.text.is_empty() {
                return Some(token);
            }
        }
    }
}

impl std::iter::FusedIterator for Scanner<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<&str> {
        scan(input).map(|t| t.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace_runs() {
        assert_eq!(words("  a \t b\n\nc  "), vec!["a", "b", "c"]);
    }

    #[test]
    fn quoted_span_is_one_token() {
        assert_eq!(
            words(r#""Mega Mouse" 1.3 2"#),
            vec!["Mega Mouse", "1.3", "2"]
        );
    }

    #[test]
    fn quoted_span_preserves_inner_whitespace() {
        let tokens: Vec<_> = scan(r#"say "  two  spaces ""#).collect();
        assert_eq!(tokens[1].as_str(), "  two  spaces ");
        assert!(tokens[1].is_quoted());
        assert!(!tokens[0].is_quoted());
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(words(r#"task "Kill the monster"#), vec!["task", "Kill the monster"]);
    }

    #[test]
    fn empty_quotes_are_skipped() {
        assert_eq!(words(r#"a "" b"#), vec!["a", "b"]);
        assert!(words(r#""""#).is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(words("").is_empty());
        assert!(words("   \n ").is_empty());
    }

    #[test]
    fn spans_point_into_input() {
        let input = r#"hp "4 2" x"#;
        for token in scan(input) {
            assert_eq!(&input[token.span()], token.as_str());
        }
    }

    #[test]
    fn scanner_is_restartable_by_clone() {
        let scanner = scan("one two three");
        let first: Vec<_> = scanner.clone().collect();
        let second: Vec<_> = scanner.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn rest_reports_unconsumed_tail() {
        let mut scanner = scan("cnf  keep the rest");
        assert_eq!(scanner.next().unwrap().as_str(), "cnf");
        assert_eq!(scanner.rest(), "keep the rest");
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(words("héllo \"wörld ✓\""), vec!["héllo", "wörld ✓"]);
    }
}
