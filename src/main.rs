//! # InvoiceCraft CLI
//!
//! Usage:
//!   invoicecraft invoice.json -o out/
//!   echo '{ ... }' | invoicecraft --locale en-US
//!   invoicecraft --example > invoice.json
//!
//! The PDF is written as `<prefix>_<invoiceNumber>.pdf` inside the output
//! directory. Set `RUST_LOG=debug` to see layout decisions.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use invoicecraft::{DirectoryTarget, Document, Exporter, InvoiceError, Locale, PageSize, RenderOptions};

#[derive(Parser)]
#[command(name = "invoicecraft", version, about = "Render an invoice document to PDF")]
struct Cli {
    /// Document JSON file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Directory the PDF is written to
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Currency and date conventions: pt-BR or en-US
    #[arg(long, default_value = "pt-BR")]
    locale: Locale,

    /// Page size: a4, letter or legal
    #[arg(long = "page-size", default_value = "a4")]
    page_size: PageSize,

    /// Print a sample document and exit
    #[arg(long)]
    example: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_document_json());
        return;
    }

    match run(&cli) {
        Ok((path, size)) => {
            eprintln!("✓ Written {} bytes to {}", size, path.display());
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<(PathBuf, usize), InvoiceError> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let document = Document::from_json(&input)?;
    let exporter = Exporter::new(RenderOptions {
        page_size: cli.page_size,
        locale: cli.locale,
    });
    let mut target = DirectoryTarget::new(&cli.out_dir);
    let file = exporter.export_to(&document, &mut target)?;
    Ok((target.path_for(&file.filename), file.bytes.len()))
}

fn example_document_json() -> &'static str {
    r##"{
  "client": {
    "name": "Ana Silva",
    "email": "ana.silva@example.com",
    "address": "Rua das Flores, 100\nSão Paulo - SP",
    "documentType": "invoice",
    "invoiceNumber": "INV-2026-042",
    "invoiceDate": "2026-10-19",
    "dueDate": "2026-11-03",
    "notes": "Pagamento via PIX ou transferência bancária.\nObrigado pela preferência!",
    "accentColor": "#0f766e"
  },
  "items": [
    { "description": "Consultoria em arquitetura de software", "quantity": 2, "unitPrice": 150.00 },
    { "description": "Suporte mensal", "quantity": 1, "unitPrice": 75.00 }
  ]
}
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_document_is_complete() {
        let doc = Document::from_json(example_document_json()).unwrap();
        assert!(doc.is_complete(), "missing: {:?}", doc.missing_fields());
        assert_eq!(doc.total(), rust_decimal::Decimal::from(375));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["invoicecraft", "doc.json", "-o", "out", "--locale", "en-US"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("doc.json")));
        assert_eq!(cli.out_dir, PathBuf::from("out"));
        assert_eq!(cli.locale, Locale::EN_US);
        assert_eq!(cli.page_size, PageSize::A4);
        assert!(Cli::try_parse_from(["invoicecraft", "--locale", "fr-FR"]).is_err());
    }
}
