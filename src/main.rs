//! CLI entry point for pdf-harvest.
//!
//! Takes no arguments: every run uses the built-in defaults. Progress and the
//! final summary go to stdout, diagnostics go to stderr through `tracing`.

use anyhow::Result;
use pdf_harvest::{GoogleSearch, HarvestConfig, HarvestEvent, HarvestReport, harvest};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing("info");

    let config = HarvestConfig::default();
    info!(
        query = %config.query,
        domain = %config.target_domain,
        folder = %config.download_folder.display(),
        max_results = config.max_results,
        "pdf-harvest starting"
    );
    println!(
        "Searching for: \"{}\" (up to {} results)",
        config.query, config.max_results
    );

    let provider = match GoogleSearch::new() {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = %e, "could not build search client");
            return Ok(());
        }
    };

    match harvest(&config, &provider, |event| println!("{}", render_event(&event))).await {
        Ok(report) => println!("{}", render_summary(&report)),
        Err(e) => error!(error = %e, "harvest aborted"),
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn render_event(event: &HarvestEvent<'_>) -> String {
    match event {
        HarvestEvent::LinksCollected { count: 0 } => {
            "No matching PDF links found in the search results.".to_string()
        }
        HarvestEvent::LinksCollected { count } => {
            format!("\nFound {count} unique PDF links. Starting downloads...")
        }
        HarvestEvent::Attempt { index, total, url } => {
            format!("\n--- Processing link {index}/{total} ---\nDownloading: {url}")
        }
        HarvestEvent::Saved { path, .. } => format!("Saved: {}", path.display()),
        HarvestEvent::Failed { url, error } => format!("Failed ({}): {url}", error.kind()),
    }
}

fn render_summary(report: &HarvestReport) -> String {
    format!(
        "\nDownload run finished.\nAttempted {} links, downloaded {} PDF files.\nFiles are saved in \"{}\".",
        report.attempted,
        report.succeeded,
        report.folder.display()
    )
}
