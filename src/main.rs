//! # Folio CLI
//!
//! Usage:
//!   folio render --template template.json --invoice invoice.json -o invoice.pdf
//!   folio example-template > template.json
//!   folio example-invoice > invoice.json
//!   folio import --as-new exported.json > template.json
//!
//! Set `RUST_LOG=folio=debug` for resource and layout tracing.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use folio::{
    export_template, import_template, Engine, EngineConfig, FolioError, ImportMode, Invoice, InvoiceTemplate,
    Severity,
};

/// Folio - invoice documents from templates
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an invoice to PDF
    Render {
        /// Template JSON file
        #[arg(long, short)]
        template: PathBuf,

        /// Invoice JSON file
        #[arg(long, short)]
        invoice: PathBuf,

        /// Engine configuration JSON file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Output PDF path
        #[arg(short, long, default_value = "invoice.pdf")]
        output: PathBuf,
    },
    /// Print the standard template as JSON
    ExampleTemplate,
    /// Print a sample invoice as JSON
    ExampleInvoice,
    /// Validate an exported template and print the normalized JSON
    Import {
        /// Exported template JSON file
        file: PathBuf,

        /// Assign a fresh id and creation time
        #[arg(long)]
        as_new: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("folio=warn")).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FolioError> {
    match cli.command {
        Commands::Render {
            template,
            invoice,
            config,
            output,
        } => {
            let config = match config {
                Some(path) => EngineConfig::from_file(&path)?,
                None => EngineConfig::default(),
            };
            let template: InvoiceTemplate = read_json(&template, "template")?;
            let invoice: Invoice = read_json(&invoice, "invoice")?;

            let rendered = Engine::new(config).render(&template, &invoice).await?;
            for diagnostic in &rendered.diagnostics {
                let marker = match diagnostic.severity {
                    Severity::Warning => "warning",
                    Severity::Fault => "fault",
                };
                match diagnostic.section {
                    Some(kind) => eprintln!("{} [{}]: {}", marker, kind.as_str(), diagnostic.message),
                    None => eprintln!("{}: {}", marker, diagnostic.message),
                }
            }

            fs::write(&output, &rendered.bytes)?;
            eprintln!(
                "✓ Written {} page(s), {} bytes to {}",
                rendered.page_count,
                rendered.bytes.len(),
                output.display()
            );
        }
        Commands::ExampleTemplate => {
            println!("{}", export_template(&InvoiceTemplate::standard("Standard"))?);
        }
        Commands::ExampleInvoice => {
            print!("{}", example_invoice_json());
        }
        Commands::Import { file, as_new } => {
            let json = fs::read_to_string(&file)?;
            let mode = if as_new { ImportMode::AsNew } else { ImportMode::Preserve };
            let template = import_template(&json, mode)?;
            println!("{}", export_template(&template)?);
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &'static str) -> Result<T, FolioError> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| FolioError::parse(what, e))
}

fn example_invoice_json() -> &'static str {
    r##"{
  "number": "INV-2026-001",
  "referenceNumber": "PRJ-118",
  "issuer": {
    "name": "Acme Corp",
    "address": "123 Business St, Suite 100\nSan Francisco, CA 94102",
    "email": "billing@acme.example",
    "phone": "+1 415 555 0100"
  },
  "recipient": {
    "name": "Widget Industries",
    "address": "456 Client Ave\nNew York, NY 10001",
    "email": "accounts@widget.example"
  },
  "issueDate": "2026-02-01",
  "dueDate": "2026-03-03",
  "lineItems": [
    { "description": "Website redesign", "quantity": 1, "unitPrice": 3500, "amount": 3500 },
    { "description": "Hosting (12 months)", "itemCode": "HOST-12", "quantity": 12, "unitPrice": 45, "amount": 540 },
    { "description": "Content migration", "quantity": 16, "unitPrice": 95, "amount": 1520 }
  ],
  "subtotal": 5560,
  "taxTotal": 444.8,
  "taxes": [{ "name": "Sales Tax", "rate": 8, "amount": 444.8 }],
  "total": 6004.8,
  "balanceDue": 6004.8,
  "currency": "USD",
  "notes": "Thank you for choosing Acme Corp.",
  "status": "pending"
}
"##
}
