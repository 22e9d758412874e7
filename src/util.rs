use unicode_width::UnicodeWidthStr;

/// Format seconds as `MM:SS`.
pub fn fmt_mmss(total_seconds: u64) -> String {
    let m = total_seconds / 60;
    let s = total_seconds % 60;
    format!("{:02}:{:02}", m, s)
}

/// Format seconds as `HH:MM` within a 24h window (used once a session passes an hour).
pub fn fmt_hhmm(total_seconds: u64) -> String {
    let s = total_seconds % 86_400;
    let hh = s / 3600;
    let mm = (s % 3600) / 60;
    format!("{:02}:{:02}", hh, mm)
}

/// Center `text` into a `cols`-wide region by left-padding with spaces.
///
/// Text wider than the region is truncated. Width is display width, not
/// char count, since breath rows contain block glyphs.
pub fn center_to_cols(text: &str, cols: usize) -> String {
    let mut text: String = text.to_string();
    while text.width() > cols {
        text.pop();
    }
    let pad = cols.saturating_sub(text.width()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_mmss() {
        assert_eq!(fmt_mmss(0), "00:00");
        assert_eq!(fmt_mmss(61), "01:01");
        assert_eq!(fmt_mmss(3599), "59:59");
    }

    #[test]
    fn test_fmt_hhmm() {
        assert_eq!(fmt_hhmm(0), "00:00");
        assert_eq!(fmt_hhmm(3600), "01:00");
        assert_eq!(fmt_hhmm(3660), "01:01");
        // wraps at a day
        assert_eq!(fmt_hhmm(86_400), "00:00");
    }

    #[test]
    fn test_center_to_cols_pads_evenly() {
        assert_eq!(center_to_cols("ab", 6), "  ab");
        assert_eq!(center_to_cols("abc", 7), "  abc");
    }

    #[test]
    fn test_center_to_cols_truncates() {
        assert_eq!(center_to_cols("abcdef", 4), "abcd");
    }

    #[test]
    fn test_center_to_cols_block_glyphs() {
        let row = "▒ █ ▒";
        assert_eq!(center_to_cols(row, 9), "  ▒ █ ▒");
    }

    #[test]
    fn test_center_to_cols_exact_fit() {
        assert_eq!(center_to_cols("abcd", 4), "abcd");
    }
}
