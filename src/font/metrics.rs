//! Glyph advance widths for the standard Helvetica faces.
//!
//! Values are in 1/1000 em, taken from the Adobe Core14 AFM files. Only the
//! printable ASCII range is tabulated; Latin-1 letters borrow the width of
//! their base letter, which matches the AFM data for both faces.

use super::encoding::printed_char;

/// Width table for one standard font face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Advances for U+0020 ..= U+007E.
    ascii: [u16; 95],
    /// Width used when a character has no better estimate.
    fallback: u16,
    bold: bool,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points at `font_size`, measured as the glyph
    /// the PDF writer will emit for it.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(printed_char(ch)) as f64 / 1000.0 * font_size
    }

    /// Width of `text` in points, adding `letter_spacing` after every char.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }

    fn units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        match ch {
            '\u{00A0}' => self.ascii[0],
            'À'..='Å' => self.ascii_of('A'),
            'Æ' => 1000,
            'Ç' => self.ascii_of('C'),
            'È'..='Ë' => self.ascii_of('E'),
            'Ì'..='Ï' => self.ascii_of('I'),
            'Ð' => self.ascii_of('D'),
            'Ñ' => self.ascii_of('N'),
            'Ò'..='Ö' | 'Ø' => self.ascii_of('O'),
            'Ù'..='Ü' => self.ascii_of('U'),
            'Ý' => self.ascii_of('Y'),
            'Þ' => self.ascii_of('P'),
            'ß' => 611,
            'à'..='å' => self.ascii_of('a'),
            'æ' => 889,
            'ç' => self.ascii_of('c'),
            'è'..='ë' => self.ascii_of('e'),
            'ì'..='ï' => 278,
            'ð' | 'ò'..='ö' => self.ascii_of('o'),
            'ø' => 611,
            'ñ' => self.ascii_of('n'),
            'ù'..='ü' => self.ascii_of('u'),
            'ý' | 'ÿ' => self.ascii_of('y'),
            'þ' => self.ascii_of('p'),
            '°' => 400,
            'ª' => 370,
            'º' => 365,
            '§' | '€' | '£' | '«' | '»' | '–' => 556,
            '©' | '®' => 737,
            '·' => 278,
            '•' => 350,
            '—' | '…' => 1000,
            '‘' | '’' => {
                if self.bold {
                    278
                } else {
                    222
                }
            }
            '“' | '”' => {
                if self.bold {
                    500
                } else {
                    333
                }
            }
            _ => self.fallback,
        }
    }

    fn ascii_of(&self, ch: char) -> u16 {
        self.ascii[(ch as u32 - 0x20) as usize]
    }
}

pub(crate) static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        // space ! " # $ % & ' ( ) * + , - . /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // : ; < = > ? @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778,
        722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [ \ ] ^ _ `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556,
        333, 500, 278, 556, 500, 722, 500, 500, 500,
        // { | } ~
        334, 260, 334, 584,
    ],
    fallback: 556,
    bold: false,
};

pub(crate) static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        // space ! " # $ % & ' ( ) * + , - . /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // : ; < = > ? @
        333, 333, 584, 584, 584, 611, 975,
        // A-Z
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778,
        722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [ \ ] ^ _ `
        333, 278, 333, 584, 556, 333,
        // a-z
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611,
        389, 556, 333, 611, 556, 778, 556, 556, 500,
        // { | } ~
        389, 280, 389, 584,
    ],
    fallback: 556,
    bold: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        let w = HELVETICA.char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_accented_letters_match_base() {
        assert_eq!(HELVETICA.units('ã'), HELVETICA.units('a'));
        assert_eq!(HELVETICA.units('Ç'), HELVETICA.units('C'));
        assert_eq!(HELVETICA_BOLD.units('é'), HELVETICA_BOLD.units('e'));
    }

    #[test]
    fn test_tab_measures_as_space() {
        assert_eq!(HELVETICA.char_width('\t', 10.0), HELVETICA.char_width(' ', 10.0));
        assert_eq!(
            HELVETICA_BOLD.measure_string("a\tb", 10.0, 0.0),
            HELVETICA_BOLD.measure_string("a b", 10.0, 0.0)
        );
    }

    #[test]
    fn test_unmappable_measures_as_question_mark() {
        assert_eq!(HELVETICA.char_width('日', 12.0), HELVETICA.char_width('?', 12.0));
        assert_eq!(
            HELVETICA.measure_string("日本", 12.0, 0.0),
            HELVETICA.measure_string("??", 12.0, 0.0)
        );
    }

    #[test]
    fn test_nbsp_is_space() {
        assert_eq!(HELVETICA.units('\u{00A0}'), HELVETICA.units(' '));
    }
}
