//! # Font Management
//!
//! The invoice template only draws with the standard PDF Helvetica faces,
//! which every viewer ships, so nothing is embedded. This module maps a
//! template weight to a standard face and measures strings with the face's
//! real advance widths.

pub mod encoding;
pub mod metrics;

pub use metrics::StandardFontMetrics;

use crate::style::FontWeight;

/// The standard PDF fonts used by the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }

    pub fn for_weight(weight: FontWeight) -> Self {
        match weight {
            FontWeight::Regular => Self::Helvetica,
            FontWeight::Bold => Self::HelveticaBold,
        }
    }
}

/// Shared font context used by layout and PDF serialization.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, weight: FontWeight, font_size: f64) -> f64 {
        StandardFont::for_weight(weight)
            .metrics()
            .char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(
        &self,
        text: &str,
        weight: FontWeight,
        font_size: f64,
        letter_spacing: f64,
    ) -> f64 {
        StandardFont::for_weight(weight)
            .metrics()
            .measure_string(text, font_size, letter_spacing)
    }
}
