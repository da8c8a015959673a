//! Text measurement and word wrapping

use core::ops::Range;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Baseline;
use embedded_graphics::text::renderer::TextRenderer;
use log::warn;

/// Maximum number of wrapped lines a label lays out
pub const MAX_LINES: usize = 64;

/// Byte ranges of each wrapped line within the source text
pub type Lines = heapless::Vec<Range<usize>, MAX_LINES>;

/// Text size variants
///
/// Provides three preset text sizes with corresponding embedded-graphics fonts:
/// - `Small`: 6x10 font
/// - `Medium`: 10x20 font (default)
/// - `Large`: 9x18 bold font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &ascii::FONT_6X10,
            TextSize::Medium => &ascii::FONT_10X20,
            TextSize::Large => &ascii::FONT_9X18_BOLD,
        }
    }
}

/// Horizontal anchor of a label's text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    Left,
    #[default]
    Centre,
    Right,
}

/// Vertical anchor of a label's text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Rendered width of `text` in pixels.
pub fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    MonoTextStyle::new(font, Gray4::BLACK)
        .measure_string(text, Point::zero(), Baseline::Top)
        .bounding_box
        .size
        .width
}

/// Split `text` into lines no wider than `max_width`.
///
/// Each line starts at the next newline (or the end of the text) and backs
/// off one word at a time until it fits. A word with no break point is
/// allowed to overflow, so the loop always advances at least one byte. The
/// space or newline a line breaks on is not part of either line.
pub fn wrap_lines<F>(text: &str, max_width: u32, measure: F) -> Lines
where
    F: Fn(&str) -> u32,
{
    let mut lines = Lines::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = text[start..].find('\n').map_or(text.len(), |i| start + i);

        while measure(&text[start..end]) > max_width {
            match text[start..end].rfind(' ') {
                Some(i) if i > 0 => end = start + i,
                _ => break,
            }
        }

        if lines.push(start..end).is_err() {
            warn!("Text wraps past {} lines, dropping the rest", MAX_LINES);
            break;
        }

        start = end;
        if matches!(text.as_bytes().get(start), Some(b' ') | Some(b'\n')) {
            start += 1;
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 10px wide
    fn fixed(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    fn collect<'a>(text: &'a str, lines: &Lines) -> alloc::vec::Vec<&'a str> {
        lines.iter().map(|r| &text[r.clone()]).collect()
    }

    #[test]
    fn test_short_text_is_one_line() {
        let text = "OK";
        let lines = wrap_lines(text, 100, fixed);
        assert_eq!(collect(text, &lines), ["OK"]);
    }

    #[test]
    fn test_wraps_at_last_fitting_space() {
        let text = "the quick brown fox";
        let lines = wrap_lines(text, 100, fixed);
        assert_eq!(collect(text, &lines), ["the quick", "brown fox"]);
    }

    #[test]
    fn test_newlines_force_breaks() {
        let text = "a\n\nb";
        let lines = wrap_lines(text, 100, fixed);
        assert_eq!(collect(text, &lines), ["a", "", "b"]);
    }

    #[test]
    fn test_unbreakable_word_terminates() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let lines = wrap_lines(text, 30, fixed);
        assert_eq!(
            collect(text, &lines),
            [text],
            "A token without spaces overflows instead of looping"
        );
    }

    #[test]
    fn test_zero_width_still_terminates() {
        let text = "one two three";
        let lines = wrap_lines(text, 0, fixed);
        assert_eq!(collect(text, &lines), ["one", "two", "three"]);
    }

    #[test]
    fn test_line_capacity_is_bounded() {
        let text = "a ".repeat(MAX_LINES + 10);
        let lines = wrap_lines(&text, 10, fixed);
        assert_eq!(lines.len(), MAX_LINES);
    }

    #[test]
    fn test_mono_font_width() {
        let font = TextSize::Medium.font();
        assert_eq!(text_width(font, ""), 0);
        assert_eq!(text_width(font, "OK"), 2 * font.character_size.width + font.character_spacing);
    }
}
