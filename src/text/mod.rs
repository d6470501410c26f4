//! # Text Layout
//!
//! Greedy line breaking and text measurement for the invoice template.
//!
//! Break opportunities come from UAX#14, so a description like
//! "Consultoria/implantação" can wrap after the slash and an address typed
//! with newlines keeps them. Words wider than the box are force-broken.

use crate::font::FontContext;
use crate::style::FontWeight;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    /// The text as a string, without trailing whitespace.
    pub text: String,
    /// Width of `text` in points.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset AFTER each break; convert to char indices.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    let mut char_idx = 0;
    for (byte_idx, _) in text.char_indices() {
        byte_to_char[byte_idx] = char_idx;
        char_idx += 1;
    }
    byte_to_char[text.len()] = char_idx;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break a string into lines that fit within `max_width`.
    ///
    /// Always returns at least one line; empty input yields one empty line.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font_size: f64,
        weight: FontWeight,
        letter_spacing: f64,
    ) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&ch| {
                if is_newline(ch) {
                    0.0
                } else {
                    font_context.char_width(ch, weight, font_size) + letter_spacing
                }
            })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            let char_width = char_widths[i];

            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                        lines.push(self.make_line(&chars[line_start..end], &char_widths[line_start..end]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                    // bp is the last char on this line (the break is *after* bp)
                    let break_at = bp + 1;
                    lines.push(self.make_line(
                        &chars[line_start..break_at],
                        &char_widths[line_start..break_at],
                    ));
                    line_start = break_at;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // No break point on this line: force break before the current char
                lines.push(self.make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            lines.push(self.make_line(&chars[line_start..], &char_widths[line_start..]));
        }
        if lines.is_empty() {
            lines.push(BrokenLine {
                text: String::new(),
                width: 0.0,
            });
        }

        lines
    }

    /// Width of a single-line string in points.
    pub fn measure_width(
        &self,
        font_context: &FontContext,
        text: &str,
        font_size: f64,
        weight: FontWeight,
        letter_spacing: f64,
    ) -> f64 {
        font_context.measure_string(text, weight, font_size, letter_spacing)
    }

    fn make_line(&self, chars: &[char], widths: &[f64]) -> BrokenLine {
        let mut end = chars.len();
        while end > 0 && (chars[end - 1].is_whitespace()) {
            end -= 1;
        }
        let text: String = chars[..end].iter().filter(|c| !is_newline(**c)).collect();
        let width = chars[..end]
            .iter()
            .zip(&widths[..end])
            .filter(|(c, _)| !is_newline(**c))
            .map(|(_, w)| w)
            .sum();
        BrokenLine { text, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str, max_width: f64) -> Vec<BrokenLine> {
        TextLayout::new().break_into_lines(
            &FontContext::new(),
            text,
            max_width,
            10.0,
            FontWeight::Regular,
            0.0,
        )
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        let lines = wrap("", 100.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].text.is_empty());
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = wrap("Consulting", 200.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Consulting");
        assert!(lines[0].width > 0.0 && lines[0].width <= 200.0);
    }

    #[test]
    fn test_wraps_at_spaces() {
        let lines = wrap("alpha beta gamma delta epsilon", 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 60.0 + 0.001, "{:?} overflows", line);
            assert!(!line.text.ends_with(' '));
        }
        let rejoined: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), "alpha beta gamma delta epsilon");
    }

    #[test]
    fn test_explicit_newlines_are_kept() {
        let lines = wrap("Rua A, 10\nCentro\n\nSão Paulo", 500.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Rua A, 10", "Centro", "", "São Paulo"]);
    }

    #[test]
    fn test_crlf_newlines() {
        let lines = wrap("one\r\ntwo", 500.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_long_word_is_force_broken() {
        let word = "x".repeat(80);
        let lines = wrap(&word, 50.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 50.0 + 0.001);
        }
        let total: usize = lines.iter().map(|l| l.text.len()).sum();
        assert_eq!(total, 80);
    }
}
