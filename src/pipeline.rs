use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, SinkError};
use crate::fetcher::FetchResult;
use crate::registry::{Registry, Source};
use crate::router::{route, Channel, RoutedItem};
use crate::settings::Settings;
use crate::sink::{open_channel_writers, spawn_channel_sink, spawn_image_sink, ErrorLog};

const SINK_BUFFER: usize = 64;

/// One input row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogueQuery {
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Part")]
    pub item: String,
}

/// Read the `Brand`/`Part` list. Brands are lower-cased; other columns are ignored.
pub fn read_queries(path: &Path) -> Result<Vec<CatalogueQuery>, ConfigError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut queries = Vec::new();
    for row in rdr.deserialize() {
        let mut q: CatalogueQuery = row?;
        q.brand = q.brand.to_lowercase();
        queries.push(q);
    }
    Ok(queries)
}

/// Terminal state of one row.
enum Outcome {
    Routed(RoutedItem),
    Failed { query: CatalogueQuery, reason: String },
}

/// Counts reported once every row is terminal and every sink has flushed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub routed: usize,
    pub failed: usize,
    pub records: BTreeMap<Channel, usize>,
    pub images: usize,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Done: {} rows ({} ok, {} failed).",
            self.total, self.routed, self.failed
        );
        let per_channel: Vec<String> = self
            .records
            .iter()
            .map(|(c, n)| format!("{} {}", n, c.name()))
            .collect();
        println!("Saved {}, {} images.", per_channel.join(", "), self.images);
    }
}

struct ChannelSink {
    channel: Channel,
    tx: mpsc::Sender<Arc<RoutedItem>>,
    handle: JoinHandle<Result<usize, SinkError>>,
}

pub struct Driver {
    settings: Settings,
    registry: Registry,
    client: Client,
}

impl Driver {
    pub fn new(settings: Settings, registry: Registry, client: Client) -> Self {
        Self { settings, registry, client }
    }

    /// Read the configured input list and process it.
    pub async fn run(&self) -> Result<RunSummary> {
        let queries = read_queries(&self.settings.input)?;
        info!(rows = queries.len(), input = %self.settings.input.display(), "input loaded");
        self.run_queries(queries).await
    }

    /// Fetch, extract and route every query through a bounded worker pool.
    /// A row failure is logged and recorded; it never stops the run.
    pub async fn run_queries(&self, queries: Vec<CatalogueQuery>) -> Result<RunSummary> {
        // Every brand must be known before any row is touched.
        let mut brands = BTreeSet::new();
        for q in &queries {
            self.registry.resolve(&q.brand)?;
            brands.insert(q.brand.clone());
        }

        let brand_dirs: HashMap<String, _> = brands
            .iter()
            .map(|b| (b.clone(), self.settings.brand_dir(b)))
            .collect();
        let image_dirs: HashMap<String, _> = brands
            .iter()
            .map(|b| (b.clone(), self.settings.image_dir_for(b)))
            .collect();
        for dir in image_dirs.values() {
            std::fs::create_dir_all(dir).map_err(ConfigError::from)?;
        }

        let mut error_log = ErrorLog::open(&self.settings.errors_path)?;

        let mut sinks = Vec::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            let writers = open_channel_writers(channel, &brand_dirs)?;
            let (tx, rx) = mpsc::channel(SINK_BUFFER);
            let handle = spawn_channel_sink(channel, writers, rx);
            sinks.push(ChannelSink { channel, tx, handle });
        }
        let (image_tx, image_rx) = mpsc::channel(SINK_BUFFER);
        let image_handle = spawn_image_sink(self.client.clone(), image_dirs, image_rx);

        let total = queries.len();
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );

        let concurrency = self.settings.concurrency;
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::channel::<Outcome>(concurrency * 2);

        for query in queries {
            let source = self.registry.resolve(&query.brand)?.clone();
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else { return };
                let outcome = process(&source, query).await;
                let _ = tx.send(outcome).await;
            });
        }

        // rx closes once every worker has reported
        drop(tx);

        // An error-log write failure is reported only after the sinks flush.
        let mut log_err = None;
        let mut summary = RunSummary { total, ..Default::default() };
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Outcome::Failed { query, reason } => {
                    summary.failed += 1;
                    progress_line(&pb, &query.brand, &query.item, "error", summary.routed);
                    error!(brand = %query.brand, item = %query.item, %reason, "Not found: [{} {}]", query.brand, query.item);
                    if let Err(e) = error_log.append(&query.brand, &query.item) {
                        error!(brand = %query.brand, item = %query.item, "error log write failed: {}", e);
                        log_err.get_or_insert(e);
                    }
                }
                Outcome::Routed(item) => {
                    summary.routed += 1;
                    progress_line(&pb, &item.brand, &item.item, "success", summary.routed);
                    let item = Arc::new(item);
                    for sink in &sinks {
                        if sink.tx.send(Arc::clone(&item)).await.is_err() {
                            warn!(channel = sink.channel.name(), "sink closed early");
                        }
                    }
                    let _ = image_tx.send(item).await;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        // Close every consumer and wait for it to drain and flush.
        drop(image_tx);
        let mut first_err = None;
        for ChannelSink { channel, tx, handle } in sinks {
            drop(tx);
            match handle.await.map_err(SinkError::from).and_then(|r| r) {
                Ok(n) => {
                    summary.records.insert(channel, n);
                }
                Err(e) => {
                    error!(channel = channel.name(), "sink failed: {}", e);
                    first_err.get_or_insert(e);
                }
            }
        }
        summary.images = image_handle.await.map_err(SinkError::from)?;

        if let Some(e) = first_err.or(log_err) {
            return Err(e.into());
        }
        info!(
            total = summary.total,
            ok = summary.routed,
            failed = summary.failed,
            images = summary.images,
            "run complete"
        );
        Ok(summary)
    }
}

async fn process(source: &Source, query: CatalogueQuery) -> Outcome {
    let fetched = source.fetcher.fetch(&query.item).await;
    debug!(brand = %query.brand, item = %query.item, found = fetched.is_success(), "lookup finished");
    match fetched {
        FetchResult::Failed { reason } => Outcome::Failed { query, reason },
        FetchResult::Found { document } => {
            let mut extracted = source.extractor.extract(&document);
            extracted.image_url = extracted.image_url.map(|href| {
                source
                    .fetcher
                    .resolve_url(&href)
                    .map(|u| u.to_string())
                    .unwrap_or(href)
            });
            Outcome::Routed(route(extracted, &query.brand, &query.item))
        }
    }
}

fn progress_line(pb: &ProgressBar, brand: &str, item: &str, status: &str, counter: usize) {
    let line = format!(
        "[{}] {} {} ... {} {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        brand.to_uppercase(),
        item,
        status,
        counter
    );
    if pb.is_hidden() {
        println!("{}", line);
    } else {
        pb.println(line);
    }
}
