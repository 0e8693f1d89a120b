//! Work order redaction CLI.
//!
//! Redacts a work order PDF and prints the extracted records, dumps the
//! extraction record or plain text for inspection, or runs the HTTP upload
//! endpoint.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use workorder_redactor::{server, ExtractionConfig, RedactionService};

/// Work Order Redaction Tool
///
/// Extracts the header and line items from a work order PDF and securely
/// removes sensitive values. Line item Rate and Amount are always redacted.
#[derive(Parser)]
#[command(name = "workorder-redactor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input PDF file path
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Form field to redact (can be specified multiple times)
    #[arg(short, long, value_name = "FIELD", default_value = "PO Amount", global = true)]
    field: Vec<String>,

    /// Exact text to redact wherever it appears (can be specified multiple times)
    #[arg(short, long, value_name = "TEXT", global = true)]
    text: Vec<String>,

    /// JSON file with extraction settings
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the y coordinate below which blocks are not key/value candidates
    #[arg(long, value_name = "POINTS", global = true)]
    header_cutoff: Option<f32>,

    /// Print the header and units records as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the extraction record of a PDF as JSON
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Extract plain text from a PDF (for verifying redactions)
    Text {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Serve the HTTP upload endpoint
    Serve {
        /// Address to listen on
        #[arg(long, env = "WORKORDER_BIND", default_value = "0.0.0.0:5000")]
        bind: String,

        /// Largest accepted upload, in megabytes
        #[arg(long, default_value_t = 20)]
        max_upload_mb: usize,
    },
}

/// Command handler owning the configured service.
struct Handler {
    service: RedactionService,
    verbose: bool,
}

impl Handler {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => ExtractionConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExtractionConfig::default(),
        };
        if let Some(cutoff) = cli.header_cutoff {
            config.header_cutoff = cutoff;
        }

        Ok(Self {
            service: RedactionService::new(config, cli.field.clone())
                .with_literals(cli.text.clone()),
            verbose: cli.verbose,
        })
    }

    /// Executes the full pipeline on one document.
    fn redact(&self, input: &Path, output: &Path, json: bool) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        if self.verbose {
            println!("Input:  {}", input.display());
            println!("Output: {}", output.display());
            println!("Fields: {}", self.service.fields().join(", "));
            if !self.service.literals().is_empty() {
                println!("Text:   {}", self.service.literals().join(", "));
            }
        }

        let outcome = self
            .service
            .process(input, output)
            .with_context(|| "Redaction failed")?;

        if self.verbose {
            println!("\nExtraction Summary:");
            println!("  Fields found:     {}", outcome.record.fields().len());
            println!("  Address columns:  {}", outcome.record.address().len());
            println!("  Line items:       {}", outcome.record.line_items().len());
            for note in outcome.record.notes().iter().chain(&outcome.output.notes) {
                println!("  Note: {}", note);
            }
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&outcome.output)?);
        }

        if outcome.redaction.has_redactions() {
            println!(
                "✓ Successfully redacted {} instance(s) → {}",
                outcome.redaction.instances_redacted,
                output.display()
            );
        } else {
            println!("⚠ No instances found to redact → {}", output.display());
        }

        Ok(())
    }

    fn extract(&self, input: &Path) -> Result<()> {
        let record = self
            .service
            .extract(input)
            .with_context(|| format!("Extraction failed for {}", input.display()))?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }

    fn text(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let text = self
            .service
            .extract_text(input)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }

        Ok(())
    }

    fn serve(self, bind: &str, max_upload_mb: usize) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        runtime
            .block_on(server::serve(bind, self.service, max_upload_mb * 1024 * 1024))
            .with_context(|| format!("Server on {} failed", bind))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let handler = Handler::new(&cli)?;

    match &cli.command {
        Some(Commands::Extract { input }) => handler.extract(input)?,
        Some(Commands::Text { input, output }) => handler.text(input, output.as_deref())?,
        Some(Commands::Serve {
            bind,
            max_upload_mb,
        }) => handler.serve(bind, *max_upload_mb)?,
        None => {
            // Default: redaction mode
            let input = cli
                .input
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let output = cli
                .output
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--output is required"))?;

            handler.redact(input, output, cli.json)?;
        }
    }

    Ok(())
}
