//! Helpers for logging user-supplied text without breaking log lines.
//!
//! Usernames and message bodies arrive from the network and may contain
//! newlines or control characters; everything logged through [escape_log]
//! stays on one line and is capped to a short preview.

/// Render a string safe for single-line log output.
///
/// Newlines, carriage returns, tabs, and backslashes are escaped; any other
/// control character becomes `\xNN`. Input longer than the preview cap is
/// cut with a trailing ellipsis.
pub fn escape_log(s: &str) -> String {
    const PREVIEW_CHARS: usize = 120;
    let mut out = String::with_capacity(s.len().min(PREVIEW_CHARS) + 4);
    let mut truncated = false;
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            truncated = true;
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if truncated {
        out.push('…');
    }
    out
}
