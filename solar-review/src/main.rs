//! solar-review - terminal client for rooftop solar verification
//!
//! Subcommands:
//! - `analyze`: verify one image, optionally export the audit JSON
//! - `batch`: run the demonstration batch, optionally export CSV
//! - `dashboard`: print the overview layout

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solar_common::config::load_toml_config;
use solar_common::events::{AuditEvent, EventBus};
use solar_common::logging::init_tracing;
use solar_common::AnalysisOutcome;
use solar_review::config::{ConnectionArgs, ReviewConfig};
use solar_review::dashboard::Dashboard;
use solar_review::export::{export_batch_csv, CSV_FILE_NAME};
use solar_review::single::AUDIT_FILE_NAME;
use solar_review::{BatchSession, PayloadSource, RelayClient, SingleVerification};
use tracing::{info, warn};

/// Command-line arguments for solar-review
#[derive(Parser, Debug)]
#[command(name = "solar-review")]
#[command(about = "Review client for rooftop solar verification")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify a single rooftop image
    Analyze {
        /// Image file to analyze
        #[arg(long, conflicts_with = "data_url", required_unless_present = "data_url")]
        image: Option<PathBuf>,

        /// Data URL or bare base64 image instead of a file
        #[arg(long)]
        data_url: Option<String>,

        /// Latitude in decimal degrees
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        lat: String,

        /// Longitude in decimal degrees
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        lng: String,

        /// Write the audit JSON (default file name when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = AUDIT_FILE_NAME)]
        export: Option<PathBuf>,
    },

    /// Run the batch of seeded sites one at a time
    Batch {
        /// Use `<dir>/<id>.{jpg,jpeg,png,webp}` instead of the placeholder payload
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Write the batch CSV (default file name when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = CSV_FILE_NAME)]
        export: Option<PathBuf>,
    },

    /// Print the overview dashboard
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let log = init_tracing().context("Failed to initialize logging")?;
    info!("Starting solar-review v{}", env!("CARGO_PKG_VERSION"));

    let toml = load_toml_config(cli.connection.config.as_deref())
        .context("Failed to load configuration")?;
    let config = ReviewConfig::resolve(&cli.connection, &toml).context("Invalid configuration")?;
    log.apply(&config.logging).context("Failed to apply log level")?;

    let connect = || {
        RelayClient::new(&config.relay_url, config.timeout)
            .map(|client| {
                info!(relay = client.base_url(), "Using relay");
                client
            })
            .context("Failed to create relay client")
    };

    match cli.command {
        Command::Analyze {
            image,
            data_url,
            lat,
            lng,
            export,
        } => {
            let client = connect()?;
            let mut session = SingleVerification::new();
            match (image, data_url) {
                (Some(path), _) => session.load_image_file(&path)?,
                (None, Some(data)) => session.load_data_url(data),
                (None, None) => anyhow::bail!("either --image or --data-url is required"),
            }
            session.set_location(lat, lng);

            let outcome = session
                .analyze(&client)
                .await
                .context("Analysis failed. Please try again.")?;
            print_outcome(outcome);

            if let Some(path) = export {
                let written = session.export_audit(&path).context("Audit export failed")?;
                println!("Audit written to {}", written.display());
            }
        }

        Command::Batch { images_dir, export } => {
            let client = connect()?;
            let source = images_dir.map(PayloadSource::ImagesDir).unwrap_or_default();
            let events = EventBus::new(64);
            let printer = tokio::spawn(print_progress(events.subscribe()));

            let mut session = BatchSession::seeded(source, events);
            let summary = session.run(&client).await;
            // Dropping the session closes the bus and ends the printer
            let items = session.into_items();
            wait_for_printer(printer).await;

            println!(
                "{} completed, {} failed, {} degraded",
                summary.completed, summary.failed, summary.degraded
            );
            if summary.degraded > 0 {
                println!(
                    "WARNING: {} result(s) are the relay's fallback verdict, not real verifications",
                    summary.degraded
                );
            }

            if let Some(path) = export {
                let written = export_batch_csv(&items, &path).context("Batch export failed")?;
                println!("Batch audit written to {}", written.display());
            }
        }

        Command::Dashboard => {
            print!("{}", Dashboard::empty());
        }
    }

    Ok(())
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let Some(result) = outcome.result() else {
        return;
    };
    if let AnalysisOutcome::Degraded { reason, .. } = outcome {
        println!("WARNING: not a real verification ({})", reason);
    }
    println!(
        "Solar installed: {}",
        if result.solar_installed { "yes" } else { "no" }
    );
    println!("Confidence:      {:.1}%", result.confidence);
    println!("Roof type:       {}", result.roof_type);
    match &result.bounding_box {
        Some(b) => println!(
            "Panel region:    x {:.3}-{:.3}, y {:.3}-{:.3}",
            b.xmin, b.xmax, b.ymin, b.ymax
        ),
        None => println!("Panel region:    none"),
    }
    if !result.reasoning.is_empty() {
        println!("Reasoning:       {}", result.reasoning);
    }
    println!(
        "Generated at:    {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

/// Wait for the progress printer, logging a panic instead of dropping it
///
/// Returns false when the task did not finish cleanly.
async fn wait_for_printer(printer: tokio::task::JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress printer stopped abnormally: {}", e);
            false
        }
    }
}

async fn print_progress(mut rx: tokio::sync::broadcast::Receiver<AuditEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.recv().await {
            Ok(AuditEvent::BatchItemFinished {
                item_id,
                status,
                degraded,
                ..
            }) => {
                let marker = if degraded { " (fallback verdict)" } else { "" };
                println!("{:<10} {}{}", item_id, status, marker);
            }
            Ok(AuditEvent::BatchProgress { percent, .. }) => {
                println!("Progress: {}%", percent);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
