//! # Invoice Layout Engine
//!
//! Turns a [`Document`] into positioned draw commands on fixed-size pages.
//! The template is fixed: header band, client block, item table, total,
//! optional notes, footer. Every measurement is in points with the origin
//! at the top-left of the page; the PDF writer flips the y axis.
//!
//! Pagination works the same way for every section: before placing a
//! block, ask the cursor whether it fits above the safe bottom (the top of
//! the footer band minus a gap). If it doesn't and the page already has
//! content, open a continuation page and place it there. Blocks that can
//! outgrow a page split line by line instead: the client box and the notes
//! continue in a new box, and a description taller than a page continues
//! as a row fragment under a repeated table header.

use log::{debug, warn};

use crate::error::InvoiceError;
use crate::font::FontContext;
use crate::format::{format_currency, format_date, Locale};
use crate::image_loader::{load_image, LoadedImage};
use crate::model::{Document, RenderOptions};
use crate::style::{palette, Color, EdgeValues, Edges, FontWeight, TextAlign};
use crate::text::{BrokenLine, TextLayout};

// ── Template geometry ──────────────────────────────────────────────

/// Left and right page margin.
pub const MARGIN_X: f64 = 40.0;
/// Height of the colored header band on the first page.
pub const HEADER_HEIGHT: f64 = 130.0;
/// Height of the accent strip on continuation pages.
pub const CONTINUATION_STRIP: f64 = 8.0;
/// Where content starts on continuation pages.
pub const CONTINUATION_TOP: f64 = 40.0;
/// Logo bounding box inside the header band.
pub const LOGO_MAX_WIDTH: f64 = 120.0;
pub const LOGO_MAX_HEIGHT: f64 = 40.0;
/// Height of the footer band pinned to the bottom of every page.
pub const FOOTER_HEIGHT: f64 = 36.0;
/// Clearance kept between content and the footer band.
pub const SAFE_GAP: f64 = 16.0;
pub const SECTION_GAP: f64 = 24.0;

/// Item table column widths as fractions of the content width:
/// description, quantity, unit price, subtotal.
pub const COLUMN_FRACTIONS: [f64; 4] = [0.50, 0.12, 0.19, 0.19];
const CELL_PAD_X: f64 = 8.0;
const ROW_PAD_Y: f64 = 7.0;
const TABLE_HEADER_HEIGHT: f64 = 22.0;

const CLIENT_PAD: f64 = 12.0;
const CLIENT_STRIPE: f64 = 3.0;
const NOTE_PAD: f64 = 12.0;
const TOTAL_WIDTH: f64 = 220.0;
/// Gap between the logo and the invoice number it sits beside.
const LOGO_GAP: f64 = 16.0;
/// Smallest size the invoice number shrinks to before it wraps instead.
const NUMBER_MIN_SIZE: f64 = 10.0;
const NUMBER_MAX_LINES: usize = 3;
const TOTAL_HEIGHT: f64 = 36.0;

/// Helvetica ascender, as a fraction of the font size.
const ASCENT: f64 = 0.718;
/// Helvetica ascender + |descender|.
const GLYPH_HEIGHT: f64 = 0.925;

pub const ATTRIBUTION: &str = "Gerado por InvoiceCraft";

/// Font and color for one kind of text in the template.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f64,
    weight: FontWeight,
    color: Color,
    letter_spacing: f64,
    line_height: f64,
}

const SECTION_LABEL: TextStyle = TextStyle {
    size: 8.0,
    weight: FontWeight::Bold,
    color: palette::MUTED,
    letter_spacing: 1.0,
    line_height: 10.0,
};
const DOC_TYPE: TextStyle = TextStyle {
    size: 9.0,
    weight: FontWeight::Regular,
    color: Color::WHITE,
    letter_spacing: 1.5,
    line_height: 12.0,
};
const DOC_NUMBER: TextStyle = TextStyle {
    size: 22.0,
    weight: FontWeight::Bold,
    color: Color::WHITE,
    letter_spacing: 0.0,
    line_height: 26.0,
};
const HEADER_DATE: TextStyle = TextStyle {
    size: 9.0,
    weight: FontWeight::Regular,
    color: Color::WHITE,
    letter_spacing: 0.0,
    line_height: 13.0,
};
const CLIENT_NAME: TextStyle = TextStyle {
    size: 12.0,
    weight: FontWeight::Bold,
    color: palette::INK,
    letter_spacing: 0.0,
    line_height: 16.0,
};
const CLIENT_DETAIL: TextStyle = TextStyle {
    size: 10.0,
    weight: FontWeight::Regular,
    color: palette::MUTED,
    letter_spacing: 0.0,
    line_height: 14.0,
};
const TABLE_HEAD: TextStyle = TextStyle {
    size: 8.0,
    weight: FontWeight::Bold,
    color: palette::MUTED,
    letter_spacing: 0.5,
    line_height: TABLE_HEADER_HEIGHT,
};
const CELL: TextStyle = TextStyle {
    size: 10.0,
    weight: FontWeight::Regular,
    color: palette::INK,
    letter_spacing: 0.0,
    line_height: 13.0,
};
const TOTAL_LABEL: TextStyle = TextStyle {
    size: 9.0,
    weight: FontWeight::Bold,
    color: palette::MUTED,
    letter_spacing: 1.0,
    line_height: TOTAL_HEIGHT,
};
const TOTAL_AMOUNT: TextStyle = TextStyle {
    size: 16.0,
    weight: FontWeight::Bold,
    color: palette::INK,
    letter_spacing: 0.0,
    line_height: TOTAL_HEIGHT,
};
const NOTE: TextStyle = TextStyle {
    size: 9.5,
    weight: FontWeight::Regular,
    color: palette::NOTE_INK,
    letter_spacing: 0.0,
    line_height: 14.0,
};
const FOOTER: TextStyle = TextStyle {
    size: 8.0,
    weight: FontWeight::Regular,
    color: palette::FAINT,
    letter_spacing: 0.0,
    line_height: FOOTER_HEIGHT,
};

// ── Layout output ──────────────────────────────────────────────────

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every text line on the page, in drawing order.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.elements.iter().flat_map(|e| match &e.draw {
            DrawCommand::Text { lines, .. } => lines.as_slice(),
            _ => &[],
        })
    }

    /// Plain text of every line on the page.
    pub fn texts(&self) -> Vec<&str> {
        self.text_lines().map(|l| l.text.as_str()).collect()
    }

    pub fn images(&self) -> impl Iterator<Item = &LayoutElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Image { .. }))
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Draw a rectangle (background, per-side borders).
    Rect {
        background: Option<Color>,
        border_width: Edges,
        border_color: EdgeValues<Color>,
    },
    /// Draw text.
    Text { lines: Vec<TextLine>, color: Color },
    /// Draw an image scaled to the element box.
    Image { image_data: LoadedImage },
}

/// One line of text, positioned by its baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: f64,
    /// Baseline, measured from the top of the page.
    pub y: f64,
    pub width: f64,
    pub text: String,
    pub font_size: f64,
    pub weight: FontWeight,
    pub letter_spacing: f64,
}

/// Scale a `width_px` × `height_px` image into a `max_width` × `max_height`
/// box, keeping its aspect ratio. The longer side is clamped first, then
/// the other side if it still overflows.
pub fn fit_logo(width_px: f64, height_px: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    let ratio = width_px / height_px;
    let (mut w, mut h) = if ratio >= 1.0 {
        (max_width, max_width / ratio)
    } else {
        (max_height * ratio, max_height)
    };
    if h > max_height {
        h = max_height;
        w = h * ratio;
    }
    if w > max_width {
        w = max_width;
        h = w / ratio;
    }
    (w, h)
}

// ── Cursor ─────────────────────────────────────────────────────────

/// Tracks the current page and vertical position while sections are placed.
struct PageCursor {
    pages: Vec<LayoutPage>,
    width: f64,
    height: f64,
    y: f64,
    /// True while the current page has nothing but chrome on it.
    fresh: bool,
    accent: Color,
}

impl PageCursor {
    fn new(width: f64, height: f64, accent: Color) -> Self {
        Self {
            pages: vec![LayoutPage {
                width,
                height,
                elements: Vec::new(),
            }],
            width,
            height,
            y: 0.0,
            fresh: true,
            accent,
        }
    }

    fn safe_bottom(&self) -> f64 {
        self.height - FOOTER_HEIGHT - SAFE_GAP
    }

    fn content_width(&self) -> f64 {
        self.width - 2.0 * MARGIN_X
    }

    /// Vertical room on an empty continuation page.
    fn page_room(&self) -> f64 {
        self.safe_bottom() - CONTINUATION_TOP
    }

    fn fits(&self, height: f64) -> bool {
        self.y + height <= self.safe_bottom()
    }

    fn push(&mut self, element: LayoutElement) {
        self.push_chrome(element);
        self.fresh = false;
    }

    /// Push without marking the page as used.
    fn push_chrome(&mut self, element: LayoutElement) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(LayoutPage {
            width: self.width,
            height: self.height,
            elements: Vec::new(),
        });
        self.push_chrome(rect(0.0, 0.0, self.width, CONTINUATION_STRIP, Some(self.accent)));
        self.y = CONTINUATION_TOP;
        self.fresh = true;
        debug!("opened continuation page {}", self.pages.len());
    }

    /// Open a new page unless `height` fits here or the page is still empty.
    /// Returns true if a page was opened.
    fn ensure(&mut self, height: f64) -> bool {
        if self.fits(height) || self.fresh {
            return false;
        }
        self.new_page();
        true
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64, background: Option<Color>) -> LayoutElement {
    LayoutElement {
        x,
        y,
        width,
        height,
        draw: DrawCommand::Rect {
            background,
            border_width: Edges::default(),
            border_color: EdgeValues::uniform(Color::BLACK),
        },
    }
}

fn bordered(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    background: Option<Color>,
    border_width: Edges,
    border_color: Color,
) -> LayoutElement {
    LayoutElement {
        x,
        y,
        width,
        height,
        draw: DrawCommand::Rect {
            background,
            border_width,
            border_color: EdgeValues::uniform(border_color),
        },
    }
}

/// Baseline of a line of `font_size` text centered in a `line_height` slot.
fn baseline(top: f64, style: &TextStyle) -> f64 {
    top + (style.line_height - style.size * GLYPH_HEIGHT) / 2.0 + style.size * ASCENT
}

/// Height of a table row holding `lines` description lines.
fn row_height(lines: usize) -> f64 {
    lines.max(1) as f64 * CELL.line_height + 2.0 * ROW_PAD_Y
}

/// What every fragment of one item row shares.
struct ItemRow<'a> {
    cols: &'a [(f64, f64); 4],
    shade: Option<Color>,
    /// Quantity, unit price and subtotal cells.
    figures: &'a [(String, TextStyle, TextAlign); 3],
}

// ── Engine ─────────────────────────────────────────────────────────

/// Lays documents out on the invoice template.
pub struct LayoutEngine {
    fonts: FontContext,
    text: TextLayout,
    options: RenderOptions,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl LayoutEngine {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            fonts: FontContext::new(),
            text: TextLayout::new(),
            options,
        }
    }

    fn locale(&self) -> &Locale {
        &self.options.locale
    }

    /// Lay out `document` into pages. The document is never modified.
    pub fn layout(&self, document: &Document) -> Result<Vec<LayoutPage>, InvoiceError> {
        let (width, height) = self.options.page_size.dimensions();
        let min_height = HEADER_HEIGHT + FOOTER_HEIGHT + SAFE_GAP + 120.0;
        if !(width.is_finite() && height.is_finite()) || width < 2.0 * MARGIN_X + 200.0 || height < min_height {
            return Err(InvoiceError::Render(format!(
                "page size {:.0}x{:.0}pt is too small for the invoice template",
                width, height
            )));
        }

        let total = document.checked_total().ok_or_else(|| {
            InvoiceError::Render("invoice total exceeds the supported amount range".to_string())
        })?;

        let accent = document.client.header_color();
        let mut cursor = PageCursor::new(width, height, accent);

        self.layout_header(&mut cursor, document, accent);
        self.layout_client(&mut cursor, document, accent);
        self.layout_items(&mut cursor, document)?;
        self.layout_total(&mut cursor, total);
        if let Some(notes) = document.client.notes_text() {
            self.layout_notes(&mut cursor, notes);
        }

        let mut pages = cursor.pages;
        self.layout_footers(&mut pages);

        debug!(
            "laid out {} ({} items) on {} page(s)",
            document.client.invoice_number.trim(),
            document.items.len(),
            pages.len()
        );
        Ok(pages)
    }

    // ── Text helpers ───────────────────────────────────────────────

    fn wrap(&self, text: &str, max_width: f64, style: &TextStyle) -> Vec<BrokenLine> {
        self.text.break_into_lines(
            &self.fonts,
            text,
            max_width,
            style.size,
            style.weight,
            style.letter_spacing,
        )
    }

    /// One text element holding `lines`, stacked from `top`, aligned in
    /// the `[x, x + width]` span.
    fn paragraph(
        &self,
        lines: &[BrokenLine],
        x: f64,
        top: f64,
        width: f64,
        style: &TextStyle,
        align: TextAlign,
    ) -> LayoutElement {
        let text_lines = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                // letter spacing trails the last glyph; it isn't visible width
                let visible = if line.text.is_empty() {
                    0.0
                } else {
                    line.width - style.letter_spacing
                };
                let line_x = match align {
                    TextAlign::Left => x,
                    TextAlign::Center => x + (width - visible) / 2.0,
                    TextAlign::Right => x + width - visible,
                };
                TextLine {
                    x: line_x,
                    y: baseline(top + i as f64 * style.line_height, style),
                    width: visible,
                    text: line.text.clone(),
                    font_size: style.size,
                    weight: style.weight,
                    letter_spacing: style.letter_spacing,
                }
            })
            .collect();

        LayoutElement {
            x,
            y: top,
            width,
            height: lines.len().max(1) as f64 * style.line_height,
            draw: DrawCommand::Text {
                lines: text_lines,
                color: style.color,
            },
        }
    }

    /// A single unwrapped line.
    fn label(
        &self,
        text: &str,
        x: f64,
        top: f64,
        width: f64,
        style: &TextStyle,
        align: TextAlign,
    ) -> LayoutElement {
        let line = BrokenLine {
            text: text.to_string(),
            width: self.text.measure_width(
                &self.fonts,
                text,
                style.size,
                style.weight,
                style.letter_spacing,
            ),
        };
        self.paragraph(&[line], x, top, width, style, align)
    }

    fn section_label(&self, cursor: &mut PageCursor, text: &str) {
        let el = self.label(
            text,
            MARGIN_X,
            cursor.y,
            cursor.content_width(),
            &SECTION_LABEL,
            TextAlign::Left,
        );
        cursor.push(el);
        cursor.y += SECTION_LABEL.line_height + 8.0;
    }

    // ── Sections ───────────────────────────────────────────────────

    fn layout_header(&self, cursor: &mut PageCursor, document: &Document, accent: Color) {
        let client = &document.client;
        let width = cursor.width;
        cursor.push_chrome(rect(0.0, 0.0, width, HEADER_HEIGHT, Some(accent)));

        let mut logo_width = 0.0;
        if let Some(logo) = self.load_logo(client.company_logo.as_deref()) {
            let (w, h) = fit_logo(
                logo.width_px as f64,
                logo.height_px as f64,
                LOGO_MAX_WIDTH,
                LOGO_MAX_HEIGHT,
            );
            logo_width = w + LOGO_GAP;
            cursor.push_chrome(LayoutElement {
                x: MARGIN_X,
                y: (HEADER_HEIGHT - h) / 2.0,
                width: w,
                height: h,
                draw: DrawCommand::Image { image_data: logo },
            });
        }

        let right_x = MARGIN_X;
        let span = width - 2.0 * MARGIN_X;
        let mut top = 28.0;
        let doc_type = client.document_type.label().to_uppercase();
        cursor.push_chrome(self.label(&doc_type, right_x, top, span, &DOC_TYPE, TextAlign::Right));
        top += DOC_TYPE.line_height;

        // the number shares the band with the logo
        let number_x = right_x + logo_width;
        let number_span = span - logo_width;
        let (number, style) = self.fit_number(client.invoice_number.trim(), number_span);
        cursor.push_chrome(self.paragraph(&number, number_x, top, number_span, &style, TextAlign::Right));
        top += number.len() as f64 * style.line_height + 6.0;

        let mut dates = Vec::new();
        if let Some(issued) = client.invoice_date {
            dates.push(format!("Emissão: {}", format_date(issued, self.locale())));
        }
        if let Some(due) = client.due_date {
            dates.push(format!("Vencimento: {}", format_date(due, self.locale())));
        }
        for text in dates {
            cursor.push_chrome(self.label(&text, right_x, top, span, &HEADER_DATE, TextAlign::Right));
            top += HEADER_DATE.line_height;
        }

        cursor.y = HEADER_HEIGHT + 28.0;
    }

    /// Lines and style for the invoice number inside `span`. A long number
    /// is scaled down in half-point steps; below `NUMBER_MIN_SIZE` it wraps.
    fn fit_number(&self, number: &str, span: f64) -> (Vec<BrokenLine>, TextStyle) {
        let natural = self.text.measure_width(&self.fonts, number, DOC_NUMBER.size, DOC_NUMBER.weight, 0.0);
        if natural <= span {
            let line = BrokenLine {
                text: number.to_string(),
                width: natural,
            };
            return (vec![line], DOC_NUMBER);
        }

        let scaled = (DOC_NUMBER.size * span / natural * 2.0).floor() / 2.0;
        if scaled >= NUMBER_MIN_SIZE {
            let style = TextStyle {
                size: scaled,
                ..DOC_NUMBER
            };
            let line = BrokenLine {
                text: number.to_string(),
                width: self.text.measure_width(&self.fonts, number, scaled, style.weight, 0.0),
            };
            return (vec![line], style);
        }

        let style = TextStyle {
            size: NUMBER_MIN_SIZE,
            line_height: NUMBER_MIN_SIZE * 1.2,
            ..DOC_NUMBER
        };
        let mut lines = self.wrap(number, span, &style);
        if lines.len() > NUMBER_MAX_LINES {
            warn!(
                "invoice number too long for the header; showing {} of {} lines",
                NUMBER_MAX_LINES,
                lines.len()
            );
            lines.truncate(NUMBER_MAX_LINES);
        }
        (lines, style)
    }

    /// Decode the logo, or log why it was skipped.
    fn load_logo(&self, src: Option<&str>) -> Option<LoadedImage> {
        let src = src.map(str::trim).filter(|s| !s.is_empty())?;
        match load_image(src) {
            Ok(img) => {
                debug!("logo decoded: {}x{}px", img.width_px, img.height_px);
                Some(img)
            }
            Err(e) => {
                warn!("rendering without logo: {}", e);
                None
            }
        }
    }

    fn layout_client(&self, cursor: &mut PageCursor, document: &Document, accent: Color) {
        let client = &document.client;
        let box_width = cursor.content_width();
        let inner_x = MARGIN_X + CLIENT_STRIPE + CLIENT_PAD + 4.0;
        let inner_width = box_width - CLIENT_STRIPE - 2.0 * CLIENT_PAD - 4.0;

        // (line, style, gap above it)
        let mut lines: Vec<(BrokenLine, TextStyle, f64)> = self
            .wrap(client.name.trim(), inner_width, &CLIENT_NAME)
            .into_iter()
            .map(|line| (line, CLIENT_NAME, 0.0))
            .collect();
        let details = self
            .wrap(client.email.trim(), inner_width, &CLIENT_DETAIL)
            .into_iter()
            .chain(self.wrap(client.address.trim(), inner_width, &CLIENT_DETAIL));
        for (i, line) in details.enumerate() {
            let gap = if i == 0 { 4.0 } else { 0.0 };
            lines.push((line, CLIENT_DETAIL, gap));
        }

        let label = SECTION_LABEL.line_height + 8.0;
        let whole: f64 = 2.0 * CLIENT_PAD + lines.iter().map(|(_, style, gap)| gap + style.line_height).sum::<f64>();
        // keep the box whole when a page can hold it, otherwise start it here
        let first_fragment = if label + whole <= cursor.page_room() {
            whole
        } else {
            2.0 * CLIENT_PAD + lines.first().map_or(0.0, |(_, style, _)| style.line_height)
        };
        cursor.ensure(label + first_fragment);
        self.section_label(cursor, "CLIENTE");

        let mut start = 0;
        loop {
            let room = cursor.safe_bottom() - cursor.y - 2.0 * CLIENT_PAD;
            let mut used = 0.0;
            let mut end = start;
            while let Some((_, style, gap)) = lines.get(end) {
                let gap = if end == start { 0.0 } else { *gap };
                if used + gap + style.line_height > room {
                    break;
                }
                used += gap + style.line_height;
                end += 1;
            }
            if end == start && start < lines.len() {
                if !cursor.fresh {
                    cursor.new_page();
                    continue;
                }
                // not even one line fits on an empty page: place one anyway
                used = lines[start].1.line_height;
                end = start + 1;
            }

            let top = cursor.y;
            let box_height = 2.0 * CLIENT_PAD + used;
            cursor.push(bordered(
                MARGIN_X,
                top,
                box_width,
                box_height,
                None,
                Edges::uniform(0.75),
                palette::RULE,
            ));
            cursor.push(rect(MARGIN_X, top, CLIENT_STRIPE, box_height, Some(accent)));

            let mut y = top + CLIENT_PAD;
            for (i, (line, style, gap)) in lines[start..end].iter().enumerate() {
                if i > 0 {
                    y += gap;
                }
                cursor.push(self.paragraph(
                    std::slice::from_ref(line),
                    inner_x,
                    y,
                    inner_width,
                    style,
                    TextAlign::Left,
                ));
                y += style.line_height;
            }
            cursor.y = top + box_height;

            start = end;
            if start >= lines.len() {
                break;
            }
            debug!("client block continues after {} line(s)", end);
            cursor.new_page();
        }
        cursor.y += SECTION_GAP;
    }

    /// Left edge and width of each table column.
    fn columns(&self, content_width: f64) -> [(f64, f64); 4] {
        let mut x = MARGIN_X;
        COLUMN_FRACTIONS.map(|fraction| {
            let w = content_width * fraction;
            let col = (x, w);
            x += w;
            col
        })
    }

    fn table_header(&self, cursor: &mut PageCursor, cols: &[(f64, f64); 4]) {
        let top = cursor.y;
        cursor.push(rect(
            MARGIN_X,
            top,
            cursor.content_width(),
            TABLE_HEADER_HEIGHT,
            Some(palette::TABLE_HEAD),
        ));
        let headings = [
            ("DESCRIÇÃO", TextAlign::Left),
            ("QTD", TextAlign::Center),
            ("UNITÁRIO", TextAlign::Right),
            ("TOTAL", TextAlign::Right),
        ];
        for ((text, align), (x, w)) in headings.into_iter().zip(cols) {
            cursor.push(self.label(text, x + CELL_PAD_X, top, w - 2.0 * CELL_PAD_X, &TABLE_HEAD, align));
        }
        cursor.y += TABLE_HEADER_HEIGHT;
    }

    fn layout_items(&self, cursor: &mut PageCursor, document: &Document) -> Result<(), InvoiceError> {
        let cols = self.columns(cursor.content_width());
        let desc_width = cols[0].1 - 2.0 * CELL_PAD_X;

        let rows: Vec<Vec<BrokenLine>> = document
            .items
            .iter()
            .map(|item| self.wrap(item.description.trim(), desc_width, &CELL))
            .collect();
        // a row taller than this can't sit under a repeated header on any
        // page, so it is split line by line
        let tallest_whole_row = cursor.page_room() - TABLE_HEADER_HEIGHT;
        let single_line_row = row_height(1);

        let first_row = rows
            .first()
            .map(|lines| row_height(lines.len()))
            .map_or(0.0, |h| if h > tallest_whole_row { single_line_row } else { h });
        cursor.ensure(SECTION_LABEL.line_height + 8.0 + TABLE_HEADER_HEIGHT + first_row);
        self.section_label(cursor, "ITENS");
        self.table_header(cursor, &cols);

        for (i, (item, lines)) in document.items.iter().zip(&rows).enumerate() {
            let subtotal = item.checked_subtotal().ok_or_else(|| {
                InvoiceError::Render(format!("item {} subtotal exceeds the supported amount range", i + 1))
            })?;
            let figures = [
                (item.quantity.to_string(), CELL, TextAlign::Center),
                (
                    format_currency(item.unit_price, self.locale()),
                    TextStyle {
                        color: palette::MUTED,
                        ..CELL
                    },
                    TextAlign::Right,
                ),
                (
                    format_currency(subtotal, self.locale()),
                    TextStyle {
                        weight: FontWeight::Bold,
                        ..CELL
                    },
                    TextAlign::Right,
                ),
            ];
            let row = ItemRow {
                cols: &cols,
                shade: (i % 2 == 1).then_some(palette::ZEBRA),
                figures: &figures,
            };

            if row_height(lines.len()) <= tallest_whole_row {
                if !cursor.fits(row_height(lines.len())) {
                    self.continue_table(cursor, &cols);
                }
                self.item_row(cursor, &row, lines, true, true);
                continue;
            }

            let mut remaining: &[BrokenLine] = lines;
            let mut first = true;
            let mut just_opened = false;
            while !remaining.is_empty() {
                let room = cursor.safe_bottom() - cursor.y - 2.0 * ROW_PAD_Y;
                let fit = ((room / CELL.line_height).floor().max(0.0) as usize).min(remaining.len());
                let take = match fit {
                    0 if just_opened => 1,
                    0 => {
                        self.continue_table(cursor, &cols);
                        just_opened = true;
                        continue;
                    }
                    n => n,
                };
                let (chunk, rest) = remaining.split_at(take);
                self.item_row(cursor, &row, chunk, first, rest.is_empty());
                first = false;
                remaining = rest;
                if !remaining.is_empty() {
                    debug!("item {} continues after {} line(s)", i + 1, chunk.len());
                    self.continue_table(cursor, &cols);
                    just_opened = true;
                }
            }
        }

        cursor.y += 14.0;
        Ok(())
    }

    /// New page with the column header repeated on top.
    fn continue_table(&self, cursor: &mut PageCursor, cols: &[(f64, f64); 4]) {
        cursor.new_page();
        self.table_header(cursor, cols);
        debug!("item table continues on page {}", cursor.pages.len());
    }

    /// Draw one row, or one fragment of a split row. Quantity and prices go
    /// on the first fragment; the bottom rule on the last.
    fn item_row(&self, cursor: &mut PageCursor, row: &ItemRow, lines: &[BrokenLine], first: bool, last: bool) {
        let cols = row.cols;
        let top = cursor.y;
        let h = row_height(lines.len());
        let rule = if last { Edges::only_bottom(0.5) } else { Edges::default() };
        cursor.push(bordered(MARGIN_X, top, cursor.content_width(), h, row.shade, rule, palette::RULE));

        let text_top = top + ROW_PAD_Y;
        let desc_width = cols[0].1 - 2.0 * CELL_PAD_X;
        cursor.push(self.paragraph(lines, cols[0].0 + CELL_PAD_X, text_top, desc_width, &CELL, TextAlign::Left));
        if first {
            for ((text, style, align), (x, w)) in row.figures.iter().zip(&cols[1..]) {
                cursor.push(self.label(text, x + CELL_PAD_X, text_top, w - 2.0 * CELL_PAD_X, style, *align));
            }
        }
        cursor.y += h;
    }

    fn layout_total(&self, cursor: &mut PageCursor, total: rust_decimal::Decimal) {
        cursor.ensure(TOTAL_HEIGHT);
        let x = cursor.width - MARGIN_X - TOTAL_WIDTH;
        let top = cursor.y;
        cursor.push(bordered(
            x,
            top,
            TOTAL_WIDTH,
            TOTAL_HEIGHT,
            None,
            Edges::only_top(2.0),
            palette::INK,
        ));
        cursor.push(self.label("TOTAL", x, top, TOTAL_WIDTH, &TOTAL_LABEL, TextAlign::Left));
        cursor.push(self.label(
            &format_currency(total, self.locale()),
            x,
            top,
            TOTAL_WIDTH,
            &TOTAL_AMOUNT,
            TextAlign::Right,
        ));
        cursor.y = top + TOTAL_HEIGHT + SECTION_GAP;
    }

    fn layout_notes(&self, cursor: &mut PageCursor, notes: &str) {
        let inner_width = cursor.content_width() - 2.0 * NOTE_PAD;
        let lines = self.wrap(notes, inner_width, &NOTE);

        cursor.ensure(SECTION_LABEL.line_height + 8.0 + 2.0 * NOTE_PAD + NOTE.line_height);
        self.section_label(cursor, "OBSERVAÇÕES");

        let mut remaining: &[BrokenLine] = &lines;
        while !remaining.is_empty() {
            let room = cursor.safe_bottom() - cursor.y - 2.0 * NOTE_PAD;
            let fit = ((room / NOTE.line_height).floor().max(0.0) as usize).min(remaining.len());
            let take = if fit == 0 {
                if cursor.fresh {
                    // not even one line fits on an empty page: place one anyway
                    1
                } else {
                    cursor.new_page();
                    continue;
                }
            } else {
                fit
            };

            let (chunk, rest) = remaining.split_at(take);
            let top = cursor.y;
            let box_height = 2.0 * NOTE_PAD + chunk.len() as f64 * NOTE.line_height;
            cursor.push(rect(MARGIN_X, top, cursor.content_width(), box_height, Some(palette::PANEL)));
            cursor.push(self.paragraph(
                chunk,
                MARGIN_X + NOTE_PAD,
                top + NOTE_PAD,
                inner_width,
                &NOTE,
                TextAlign::Left,
            ));
            cursor.y = top + box_height + SECTION_GAP;

            remaining = rest;
            if !remaining.is_empty() {
                debug!("notes continue after {} line(s)", chunk.len());
                cursor.new_page();
            }
        }
    }

    fn layout_footers(&self, pages: &mut [LayoutPage]) {
        let total_pages = pages.len();
        for (i, page) in pages.iter_mut().enumerate() {
            let top = page.height - FOOTER_HEIGHT;
            let span = page.width - 2.0 * MARGIN_X;
            page.elements.push(bordered(
                0.0,
                top,
                page.width,
                FOOTER_HEIGHT,
                Some(palette::PANEL),
                Edges::only_top(0.75),
                palette::RULE,
            ));
            page.elements
                .push(self.label(ATTRIBUTION, MARGIN_X, top, span, &FOOTER, TextAlign::Center));
            if total_pages > 1 {
                let counter = format!("{}/{}", i + 1, total_pages);
                page.elements
                    .push(self.label(&counter, MARGIN_X, top, span, &FOOTER, TextAlign::Right));
            }
        }
    }
}
