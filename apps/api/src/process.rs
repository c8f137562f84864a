//! Helpers shared by the generator and dispatch subprocess wrappers.

use tracing::info;

/// Longest captured-output excerpt kept in errors and job records.
pub const MAX_OUTPUT_TAIL_CHARS: usize = 4_000;

/// Lossy UTF-8 decode keeping only the last `max_chars` characters.
pub fn output_tail(bytes: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let skip = total - max_chars;
    let start = text.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(0);
    format!("…{}", &text[start..])
}

/// Logs each non-empty line of a child's output under a short label.
pub fn log_output(label: &str, stream: &str, bytes: &[u8]) {
    for line in String::from_utf8_lossy(bytes).lines() {
        let line = line.trim_end();
        if !line.is_empty() {
            info!("[{label} {stream}] {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_tail_short_is_untouched() {
        assert_eq!(output_tail(b"done\n", 10), "done");
    }

    #[test]
    fn test_output_tail_keeps_end() {
        assert_eq!(output_tail(b"0123456789", 4), "…6789");
    }

    #[test]
    fn test_output_tail_respects_char_boundaries() {
        let text = "ééééé".as_bytes();
        assert_eq!(output_tail(text, 2), "…éé");
    }
}
