mod error;
mod fetcher;
mod parser;
mod pipeline;
mod registry;
mod router;
mod settings;
mod sink;

use std::time::{Duration, Instant};

use clap::Parser;

use crate::pipeline::Driver;
use crate::registry::Registry;
use crate::settings::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "catalogue_scraper",
    about = "Scrape parts-catalogue pages into CSV tables and product images"
)]
struct Cli {
    /// CSV list with `Brand` and `Part` columns [default: all.csv]
    input: Option<String>,

    /// Image directory; `%%brand%%` is replaced with the brand [default: out/%%brand%%/img]
    image_dir: Option<String>,

    /// Root directory for the per-brand CSV tables [default: out]
    #[arg(long)]
    out_dir: Option<String>,

    /// Append-only log of rows that could not be fetched [default: errors.csv]
    #[arg(long = "errors")]
    errors_path: Option<String>,

    /// Max rows in flight at once [default: 8]
    #[arg(short = 'j', long)]
    concurrency: Option<u64>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load(Overrides {
        input: cli.input,
        image_dir: cli.image_dir,
        out_dir: cli.out_dir,
        errors_path: cli.errors_path,
        concurrency: cli.concurrency,
        timeout_secs: cli.timeout_secs,
    })?;
    tracing::debug!(?settings, "settings loaded");

    let registry = Registry::with_defaults(&settings)?;
    let client = fetcher::build_client(Duration::from_secs(settings.timeout_secs))?;

    println!("Scraping {} ...", settings.input.display());
    let summary = Driver::new(settings, registry, client).run().await?;
    summary.print();

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
