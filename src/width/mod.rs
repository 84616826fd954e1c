//! Terminal display width helpers.
//!
//! ANSI-aware width calculation so text written through a [`Screen`]
//! lands on the right cells.
//!
//! [`Screen`]: crate::screen::Screen

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Number of cells a single character occupies. Control characters count as zero.
pub fn char_width(ch: char) -> u16 {
    ch.width().unwrap_or(0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_sequences_are_ignored() {
        assert_eq!(display_width("\x1b[31mred\x1b[0m"), 3);
    }

    #[test]
    fn wide_chars_take_two_cells() {
        assert_eq!(char_width('界'), 2);
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('\u{7}'), 0);
    }
}
