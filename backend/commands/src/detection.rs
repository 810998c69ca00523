//! Command detection: recognise a prefixed command in an inbound message.

/// A message that starts with the command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCommand<'a> {
    /// Lowercased command name as typed (may be an alias).
    pub name: String,
    /// Everything after the name, leading whitespace removed.
    pub raw_args: &'a str,
}

/// Detect a command at the start of `text`. Returns `None` for ordinary
/// messages and for a bare prefix.
pub fn detect_command<'a>(text: &'a str, prefix: &str) -> Option<DetectedCommand<'a>> {
    let body = text.trim_start().strip_prefix(prefix)?;

    // Find the first whitespace to split the name from its args
    let (name, rest) = body
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim_start()))
        .unwrap_or((body, ""));

    if name.is_empty() {
        return None;
    }

    Some(DetectedCommand { name: name.to_lowercase(), raw_args: rest.trim_end() })
}
