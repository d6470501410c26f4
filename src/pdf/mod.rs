//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer covering the small subset an
//! invoice needs: filled and stroked rectangles, text in the two standard
//! Helvetica faces, and image XObjects for the logo.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Output is a pure function of the pages and the info: no timestamps, no
//! random IDs, and objects are numbered in page order. Rendering the same
//! document twice yields identical bytes.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use crate::error::InvoiceError;
use crate::font::encoding::winansi_byte;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, TextLine};
use crate::style::{Color, EdgeValues, Edges};
use miniz_oxide::deflate::compress_to_vec_zlib;

pub const PRODUCER: &str = "InvoiceCraft";

/// Entries for the document information dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Fonts in resource order: `/F0`, `/F1`, ...
    font_objects: Vec<(StandardFont, usize)>,
    /// XObject ids for images, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn font_resource(&self, font: StandardFont) -> usize {
        self.font_objects
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], info: &DocumentInfo) -> Result<Vec<u8>, InvoiceError> {
        if pages.is_empty() {
            return Err(InvoiceError::Render("nothing to write: no pages".to_string()));
        }

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };
        for _ in 0..3 {
            builder.push(Vec::new());
        }

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let font_resources = self.build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids = Vec::with_capacity(pages.len());
        let mut next_image = 0usize;

        for page in pages {
            let first_image = next_image;
            let content = self.build_content_stream_for_page(page, &builder, &mut next_image);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let xobjects: String = (first_image..next_image)
                .map(|i| format!("/Im{} {} 0 R", i, builder.image_objects[i]))
                .collect::<Vec<_>>()
                .join(" ");
            let resources = if xobjects.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info_dict = String::from("<< ");
        if let Some(ref title) = info.title {
            let _ = write!(info_dict, "/Title ({}) ", Self::encode_text(title));
        }
        if let Some(ref subject) = info.subject {
            let _ = write!(info_dict, "/Subject ({}) ", Self::encode_text(subject));
        }
        let _ = write!(info_dict, "/Producer ({0}) /Creator ({0}) >>", PRODUCER);
        let info_obj_id = builder.push(info_dict.into_bytes());

        log::debug!(
            "pdf: {} page(s), {} font(s), {} image(s), {} objects",
            pages.len(),
            builder.font_objects.len(),
            builder.image_objects.len(),
            builder.objects.len() - 1
        );

        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream_for_page(
        &self,
        page: &LayoutPage,
        builder: &PdfBuilder,
        next_image: &mut usize,
    ) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder, next_image);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        next_image: &mut usize,
    ) {
        // PDF's origin is bottom-left
        let x = element.x;
        let y = page_height - element.y - element.height;
        let w = element.width;
        let h = element.height;

        match &element.draw {
            DrawCommand::Rect {
                background,
                border_width,
                border_color,
            } => {
                if let Some(bg) = background {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        bg.r, bg.g, bg.b, x, y, w, h
                    );
                }

                if border_width.is_zero() {
                    return;
                }
                if border_width.is_uniform() {
                    let bc = &border_color.top;
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        bc.r, bc.g, bc.b, border_width.top, x, y, w, h
                    );
                } else {
                    self.write_border_sides(stream, x, y, w, h, border_width, border_color);
                }
            }

            DrawCommand::Text { lines, color } => {
                let _ = write!(stream, "BT\n{:.3} {:.3} {:.3} rg\n", color.r, color.g, color.b);
                for line in lines.iter().filter(|l| !l.text.is_empty()) {
                    self.write_text_line(stream, line, page_height, builder);
                }
                stream.push_str("ET\n");
            }

            DrawCommand::Image { .. } => {
                let index = *next_image;
                *next_image += 1;
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    w, h, x, y, index
                );
            }
        }
    }

    fn write_text_line(&self, stream: &mut String, line: &TextLine, page_height: f64, builder: &PdfBuilder) {
        let font = StandardFont::for_weight(line.weight);
        let _ = write!(
            stream,
            "/F{} {:.1} Tf\n",
            builder.font_resource(font),
            line.font_size
        );
        if line.letter_spacing != 0.0 {
            let _ = write!(stream, "{:.2} Tc\n", line.letter_spacing);
        }
        // Tm, not Td: every line is placed absolutely
        let _ = write!(
            stream,
            "1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
            line.x,
            page_height - line.y,
            Self::encode_text(&line.text)
        );
        if line.letter_spacing != 0.0 {
            stream.push_str("0 Tc\n");
        }
    }

    /// Draw each border side as its own stroked line.
    #[allow(clippy::too_many_arguments)]
    fn write_border_sides(
        &self,
        stream: &mut String,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        bw: &Edges,
        bc: &EdgeValues<Color>,
    ) {
        let sides = [
            (bw.top, &bc.top, (x, y + h), (x + w, y + h)),
            (bw.bottom, &bc.bottom, (x, y), (x + w, y)),
            (bw.left, &bc.left, (x, y), (x, y + h)),
            (bw.right, &bc.right, (x + w, y), (x + w, y + h)),
        ];
        for (width, color, (x1, y1), (x2, y2)) in sides {
            if width > 0.0 {
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    color.r, color.g, color.b, width, x1, y1, x2, y2
                );
            }
        }
    }

    /// Register the fonts used across all pages, Helvetica first. A
    /// document without any text still gets `/F0`.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut used: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|p| p.text_lines())
            .map(|l| StandardFont::for_weight(l.weight))
            .collect();
        if used.is_empty() {
            used.insert(StandardFont::Helvetica);
        }

        for font in used {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.font_objects.push((font, id));
        }
    }

    /// Write every image as an XObject, in page order.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for page in pages {
            for element in &page.elements {
                if let DrawCommand::Image { image_data } = &element.draw {
                    let id = Self::write_image_xobject(builder, image_data);
                    builder.image_objects.push(id);
                }
            }
        }
    }

    /// Write an image (and its SMask, if any); returns the image object id.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed = compress_to_vec_zlib(alpha_data, 6);
                    let mut smask: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed.len()
                    );
                    smask.extend_from_slice(&compressed);
                    smask.extend_from_slice(b"\nendstream");
                    builder.push(smask)
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }
        }
    }

    fn build_font_resource_dict(&self, font_objects: &[(StandardFont, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, id))| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode text as the body of a PDF literal string: WinAnsi bytes,
    /// delimiters escaped, everything outside printable ASCII as octal.
    /// Characters WinAnsi can't represent become `?`.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = winansi_byte(ch);
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
