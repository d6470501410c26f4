//! WinAnsiEncoding, the single-byte encoding the standard fonts are drawn
//! with. Measuring and writing both go through here, so a line is measured
//! with the glyphs the viewer will actually show.

/// WinAnsi byte for `ch`, if the encoding has one.
///
/// 0x20..=0x7E and 0xA0..=0xFF match Latin-1; 0x80..=0x9F hold the
/// typographic extras. A tab is drawn as a space.
pub fn to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x09 => Some(b' '),
        0x20AC => Some(0x80), // €
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // …
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91), // ‘
        0x2019 => Some(0x92), // ’
        0x201C => Some(0x93), // “
        0x201D => Some(0x94), // ”
        0x2022 => Some(0x95), // •
        0x2013 => Some(0x96), // –
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99), // ™
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Byte written to the content stream for `ch`; unmappable chars print as `?`.
pub fn winansi_byte(ch: char) -> u8 {
    to_winansi(ch).unwrap_or(b'?')
}

/// The character a viewer shows for `ch`.
pub fn printed_char(ch: char) -> char {
    match to_winansi(ch) {
        Some(b' ') => ' ',
        Some(_) => ch,
        None => '?',
    }
}
