//! Integration tests for the InvoiceCraft rendering pipeline.
//!
//! These tests exercise the full path from JSON input to PDF output.
//! They verify:
//! - JSON deserialization, including the host form's field names
//! - Totals and locale formatting as printed on the page
//! - PDF output is structurally valid and deterministic
//! - Pagination of long tables and long notes
//! - Export naming and the one-at-a-time guard

use base64::Engine;
use invoicecraft::layout::{fit_logo, LayoutEngine, LayoutPage};
use invoicecraft::*;
use miniz_oxide::inflate::decompress_to_vec_zlib;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// ─── Helpers ────────────────────────────────────────────────────

const ANA_SILVA_JSON: &str = r##"{
  "client": {
    "name": "Ana Silva",
    "email": "ana@example.com",
    "address": "Rua das Flores, 100",
    "documentType": "invoice",
    "invoiceNumber": "INV-2026-001",
    "invoiceDate": "2026-10-19",
    "dueDate": "",
    "notes": ""
  },
  "items": [
    { "description": "Consulting", "quantity": 2, "unitPrice": "150.00" },
    { "description": "Support", "quantity": 1, "unitPrice": "75.00" }
  ]
}"##;

fn ana_silva() -> Document {
    Document::from_json(ANA_SILVA_JSON).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn many_items(n: usize) -> Document {
    let mut doc = ana_silva();
    doc.items = (0..n)
        .map(|i| LineItem::new(&format!("Serviço {}", i + 1), 1, dec("10.00")))
        .collect();
    doc
}

fn layout_doc(doc: &Document) -> Vec<LayoutPage> {
    LayoutEngine::default().layout(doc).unwrap()
}

fn render_default(doc: &Document) -> Vec<u8> {
    render(doc, &RenderOptions::default()).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-1.7"), "PDF should start with header");
    assert!(bytes.ends_with(b"%%EOF\n"), "PDF should end with EOF marker");
    assert!(contains(bytes, b"xref"), "PDF should have xref table");
    assert!(contains(bytes, b"trailer"), "PDF should have trailer");
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Decompress every FlateDecode stream in the file and concatenate them.
fn content_streams(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = bytes;
    while let Some(start) = find(rest, b"stream\n") {
        let body = &rest[start + 7..];
        let Some(end) = find(body, b"\nendstream") else { break };
        if let Ok(inflated) = decompress_to_vec_zlib(&body[..end]) {
            out.extend_from_slice(&inflated);
        }
        rest = &body[end + b"\nendstream".len()..];
    }
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn page_count(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    let at = text.find("/Type /Pages").unwrap();
    let count = &text[at..];
    let n = count.find("/Count ").unwrap() + 7;
    count[n..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap()
}

fn png_data_uri(width: u32, height: u32) -> String {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 80, 160]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf)
    )
}

// ─── Basic Pipeline Tests ───────────────────────────────────────

#[test]
fn test_ana_silva_total() {
    let doc = ana_silva();
    assert_eq!(doc.total(), dec("375.00"));
    assert!(doc.is_complete());

    let pages = layout_doc(&doc);
    assert_eq!(pages.len(), 1);
    let texts = pages[0].texts();
    assert!(texts.contains(&"R$\u{a0}300,00"));
    assert!(texts.contains(&"R$\u{a0}75,00"));
    assert!(texts.contains(&"R$\u{a0}375,00"));
    assert!(!texts.contains(&"OBSERVAÇÕES"), "blank notes draw no block");
}

#[test]
fn test_ana_silva_pdf() {
    let bytes = render_default(&ana_silva());
    assert_valid_pdf(&bytes);
    assert_eq!(page_count(&bytes), 1);
    assert!(contains(&bytes, b"/Title (Fatura INV-2026-001)"));

    let streams = content_streams(&bytes);
    assert!(contains(&streams, b"(R$\\240375,00) Tj"));
    assert!(contains(&streams, b"(Gerado por InvoiceCraft) Tj"));
}

#[test]
fn test_render_json_matches_render() {
    let from_json = render_json(ANA_SILVA_JSON).unwrap();
    assert_eq!(from_json, render_default(&ana_silva()));
}

#[test]
fn test_render_json_reports_bad_input() {
    let err = render_json("{ \"client\": { \"invoiceDate\": \"19/10/2026\" } }").unwrap_err();
    assert!(matches!(err, InvoiceError::Parse { .. }));
    let err = render_json("{ \"client\": ").unwrap_err();
    assert!(err.to_string().contains("truncated"));
}

#[test]
fn test_en_us_locale() {
    let options = RenderOptions {
        locale: Locale::EN_US,
        ..RenderOptions::default()
    };
    let pages = LayoutEngine::new(options).layout(&ana_silva()).unwrap();
    let texts = pages[0].texts();
    assert!(texts.contains(&"$375.00"));
    assert!(texts.contains(&"Emissão: 10/19/2026"));
}

#[test]
fn test_letter_page_size() {
    let options = RenderOptions {
        page_size: PageSize::Letter,
        ..RenderOptions::default()
    };
    let bytes = render(&ana_silva(), &options).unwrap();
    assert!(contains(&bytes, b"/MediaBox [0 0 612.00 792.00]"));
}

#[test]
fn test_host_form_field_names() {
    let json = r##"{
      "client": {
        "clientName": "Bruno Costa",
        "email": "bruno@example.com",
        "address": "Av. Paulista, 1000",
        "documentType": "service-order",
        "invoiceNumber": "OS-77",
        "invoiceDate": "2026-10-01",
        "respectNoteColor": "#0053a6"
      },
      "services": [{ "description": "Reparo", "quantity": 3, "unitPrice": 40.5 }]
    }"##;
    let doc = Document::from_json(json).unwrap();
    assert_eq!(doc.client.name, "Bruno Costa");
    assert_eq!(doc.client.document_type, DocumentType::ServiceOrder);
    assert_eq!(doc.total(), dec("121.5"));
    assert_eq!(export_filename(&doc), "OrdemServico_OS-77.pdf");

    let pages = layout_doc(&doc);
    assert!(pages[0].texts().contains(&"ORDEM DE SERVIÇO"));
}

// ─── Logo Tests ─────────────────────────────────────────────────

#[test]
fn test_logo_is_embedded_and_fitted() {
    let mut doc = ana_silva();
    doc.client.company_logo = Some(png_data_uri(300, 100));

    let pages = layout_doc(&doc);
    let logo = pages[0].images().next().expect("logo placed");
    assert!((logo.width - 120.0).abs() < 1e-9);
    assert!((logo.height - 40.0).abs() < 1e-9);

    let bytes = render_default(&doc);
    assert_valid_pdf(&bytes);
    assert!(contains(&bytes, b"/Subtype /Image"));
}

#[test]
fn test_undecodable_logo_still_renders() {
    let mut doc = ana_silva();
    doc.client.company_logo = Some("data:image/png;base64,bm90IGFuIGltYWdl".to_string());

    let bytes = render_default(&doc);
    assert_valid_pdf(&bytes);
    assert!(!contains(&bytes, b"/XObject"));
    assert!(contains(&content_streams(&bytes), b"(INV-2026-001) Tj"));
}

// ─── Determinism ────────────────────────────────────────────────

#[test]
fn test_rendering_is_byte_identical() {
    let mut doc = many_items(45);
    doc.client.company_logo = Some(png_data_uri(64, 64));
    doc.client.notes = Some("Pagamento em até 15 dias.".to_string());
    assert_eq!(render_default(&doc), render_default(&doc));
}

#[test]
fn test_render_does_not_modify_document() {
    let doc = ana_silva();
    let before = doc.clone();
    let _ = render_default(&doc);
    assert_eq!(doc, before);
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_many_items_span_pages() {
    let doc = many_items(80);
    let pages = layout_doc(&doc);
    assert!(pages.len() >= 2);

    for (i, page) in pages.iter().enumerate() {
        let texts = page.texts();
        assert!(texts.contains(&"DESCRIÇÃO"), "page {} lacks the table header", i + 1);
        assert!(texts.contains(&"Gerado por InvoiceCraft"));
        let counter = format!("{}/{}", i + 1, pages.len());
        assert!(texts.contains(&counter.as_str()));
    }

    let last = pages.last().unwrap().texts();
    assert!(last.contains(&"R$\u{a0}800,00"), "total on the last page");

    let bytes = render_default(&doc);
    assert_eq!(page_count(&bytes), pages.len());
}

#[test]
fn test_long_notes_are_not_truncated() {
    let mut doc = ana_silva();
    let paragraph = (1..=90)
        .map(|i| format!("Observação número {}.", i))
        .collect::<Vec<_>>()
        .join("\n");
    doc.client.notes = Some(paragraph);

    let pages = layout_doc(&doc);
    assert!(pages.len() >= 2);
    let all: Vec<&str> = pages.iter().flat_map(|p| p.texts()).collect();
    for i in [1, 45, 90] {
        let line = format!("Observação número {}.", i);
        assert!(all.contains(&line.as_str()), "{} missing", line);
    }
}

// ─── Export ─────────────────────────────────────────────────────

#[test]
fn test_export_filenames() {
    let mut doc = ana_silva();
    for (kind, expected) in [
        (DocumentType::Invoice, "Fatura_INV-2026-001.pdf"),
        (DocumentType::Subscription, "Mensalidade_INV-2026-001.pdf"),
        (DocumentType::ServiceOrder, "OrdemServico_INV-2026-001.pdf"),
    ] {
        doc.client.document_type = kind;
        let file = Exporter::default().export(&doc).unwrap();
        assert_eq!(file.filename, expected);
        assert_eq!(file.mime_type, "application/pdf");
    }
}

#[test]
fn test_export_refuses_incomplete() {
    let mut doc = ana_silva();
    doc.client.email = "  ".to_string();
    doc.items.clear();
    match Exporter::default().export(&doc) {
        Err(InvoiceError::Incomplete(missing)) => assert_eq!(missing.len(), 2),
        other => panic!("expected Incomplete, got {:?}", other.map(|f| f.filename)),
    }
    // rendering directly is still allowed
    assert_valid_pdf(&render_default(&doc));
}

// ─── Properties ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// The total is always the sum of quantity × unit price.
    #[test]
    fn total_is_sum_of_subtotals(
        rows in prop::collection::vec((0u32..1000, 0i64..10_000_000), 0..20)
    ) {
        let items: Vec<LineItem> = rows
            .iter()
            .map(|&(q, cents)| LineItem::new("x", q, Decimal::new(cents, 2)))
            .collect();
        let expected = rows
            .iter()
            .fold(Decimal::ZERO, |acc, &(q, cents)| acc + Decimal::from(q) * Decimal::new(cents, 2));
        let doc = Document::new(ClientInfo::default(), items);
        prop_assert_eq!(doc.total(), expected);
        prop_assert_eq!(doc.checked_total(), Some(expected));
    }

    /// A fitted logo keeps its aspect ratio and stays inside the box.
    #[test]
    fn logo_fit_preserves_ratio(w in 1u32..5000, h in 1u32..5000) {
        let (fw, fh) = fit_logo(w as f64, h as f64, 120.0, 40.0);
        prop_assert!(fw <= 120.0 + 1e-9 && fh <= 40.0 + 1e-9);
        let ratio = w as f64 / h as f64;
        prop_assert!((fw / fh - ratio).abs() / ratio < 1e-9);
        // one side touches the box
        prop_assert!((fw - 120.0).abs() < 1e-9 || (fh - 40.0).abs() < 1e-9);
    }
}
