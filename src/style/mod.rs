//! # Style Primitives
//!
//! The handful of visual properties the invoice template needs: colors,
//! per-side edge values for borders, and horizontal text alignment.
//!
//! The template is fixed, so there is no cascade here. Layout code picks
//! values from the palette below and attaches them to draw commands.

/// An RGB color with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
    ///
    /// Returns `None` for anything else, including named colors.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b)
            }
            _ => return None,
        };
        Some(Self::rgb8(r, g, b))
    }

    /// Compare two colors at 8-bit precision.
    pub fn same_rgb8(&self, other: &Color) -> bool {
        let q = |v: f64| (v * 255.0).round() as i32;
        q(self.r) == q(other.r) && q(self.g) == q(other.g) && q(self.b) == q(other.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// The template palette.
pub mod palette {
    use super::Color;

    /// Header band when no accent color is chosen.
    pub const HEADER_DARK: Color = Color::rgb8(0x1a, 0x1a, 0x1a);
    /// Body text.
    pub const INK: Color = Color::rgb8(0x1a, 0x1a, 0x1a);
    /// Secondary text: labels, email, address.
    pub const MUTED: Color = Color::rgb8(0x6b, 0x72, 0x80);
    /// Notes text.
    pub const NOTE_INK: Color = Color::rgb8(0x4b, 0x55, 0x63);
    /// Footer attribution.
    pub const FAINT: Color = Color::rgb8(0x9c, 0xa3, 0xaf);
    /// Table header background and row separators.
    pub const RULE: Color = Color::rgb8(0xe5, 0xe7, 0xeb);
    /// Zebra shading for odd table rows.
    pub const ZEBRA: Color = Color::rgb8(0xf9, 0xfa, 0xfb);
    /// Table header background.
    pub const TABLE_HEAD: Color = Color::rgb8(0xf3, 0xf4, 0xf6);
    /// Footer band and notes box background.
    pub const PANEL: Color = Color::rgb8(0xf9, 0xfa, 0xfb);
}

/// Edge values (top, right, bottom, left) in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn only_top(v: f64) -> Self {
        Self {
            top: v,
            ..Self::default()
        }
    }

    pub fn only_bottom(v: f64) -> Self {
        Self {
            bottom: v,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top <= 0.0 && self.right <= 0.0 && self.bottom <= 0.0 && self.left <= 0.0
    }

    pub fn is_uniform(&self) -> bool {
        (self.top - self.right).abs() < 0.001
            && (self.right - self.bottom).abs() < 0.001
            && (self.bottom - self.left).abs() < 0.001
    }
}

/// Per-side values of any type (used for border colors).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeValues<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> EdgeValues<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

/// Horizontal alignment of a text run inside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Standard font weight used by the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long_and_short() {
        let c = Color::parse_hex("#0053a6").unwrap();
        assert!(c.same_rgb8(&Color::rgb8(0x00, 0x53, 0xa6)));
        let short = Color::parse_hex("#fff").unwrap();
        assert!(short.same_rgb8(&Color::WHITE));
        let bare = Color::parse_hex("1a1a1a").unwrap();
        assert!(bare.same_rgb8(&palette::HEADER_DARK));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(Color::parse_hex("blue").is_none());
        assert!(Color::parse_hex("#12345").is_none());
        assert!(Color::parse_hex("#gggggg").is_none());
        assert!(Color::parse_hex("").is_none());
    }

    #[test]
    fn test_edges_uniform() {
        assert!(Edges::uniform(1.0).is_uniform());
        assert!(!Edges::only_top(1.0).is_uniform());
        assert!(Edges::default().is_zero());
    }
}
