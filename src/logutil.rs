//! Helpers for putting player-supplied text into log lines.
//! Chat input can carry newlines and control characters that would split or spoof log records.

use std::fmt::Write;

const MAX_PREVIEW: usize = 120;

/// Single-line, length-capped rendering of untrusted text.
///
/// Backslash, newline, carriage return and tab get their usual escapes; any other
/// control character becomes `\xNN`. Input longer than the preview cap ends with `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count == MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escaped command arguments joined with single spaces.
pub fn escape_args(args: &[String]) -> String {
    escape_log(&args.join(" "))
}
