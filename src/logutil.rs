//! Single-line log rendering for user-entered text (task titles, NPC lines).

use std::fmt::Write;

const MAX_PREVIEW: usize = 160;

/// Escape `s` so it cannot break a log line: backslash, `\n`, `\r` and `\t`
/// become escape sequences, other control characters become `\xNN`. Text
/// longer than the preview limit is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_PREVIEW)
}

pub fn escape_log_with_limit(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_stay_on_one_line() {
        assert_eq!(escape_log("Buy milk\nand eggs\t!"), "Buy milk\\nand eggs\\t!");
        assert_eq!(escape_log("C:\\tasks"), "C:\\\\tasks");
        assert_eq!(escape_log("bell\x07"), "bell\\x07");
    }

    #[test]
    fn long_text_is_cut() {
        assert_eq!(escape_log_with_limit("abcdef", 3), "abc…");
        assert_eq!(escape_log(&"x".repeat(500)).chars().count(), MAX_PREVIEW + 1);
    }
}
