use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::router::{Channel, ImageTask, RoutedItem};

/// Open `{dir}/{channel file}` for every brand and write the header row.
pub fn open_channel_writers(
    channel: Channel,
    brand_dirs: &HashMap<String, PathBuf>,
) -> Result<HashMap<String, csv::Writer<File>>, SinkError> {
    let mut writers = HashMap::new();
    for (brand, dir) in brand_dirs {
        std::fs::create_dir_all(dir)?;
        let mut w = csv::Writer::from_path(dir.join(channel.file_name()))?;
        w.write_record(channel.header())?;
        writers.insert(brand.clone(), w);
    }
    Ok(writers)
}

/// Consume routed items and append this channel's records, in arrival order,
/// to the brand's file. Returns the number of records written once the
/// sender side closes and everything is flushed.
pub fn spawn_channel_sink(
    channel: Channel,
    mut writers: HashMap<String, csv::Writer<File>>,
    mut rx: mpsc::Receiver<Arc<RoutedItem>>,
) -> JoinHandle<Result<usize, SinkError>> {
    tokio::task::spawn_blocking(move || {
        let mut written = 0usize;
        while let Some(item) = rx.blocking_recv() {
            let records = item.records(channel);
            if records.is_empty() {
                continue;
            }
            // brands are validated before the run, so a writer always exists
            let Some(w) = writers.get_mut(&item.brand) else {
                warn!(brand = %item.brand, channel = channel.name(), "no writer for brand");
                continue;
            };
            for record in records {
                w.write_record(record)?;
            }
            written += records.len();
        }
        for w in writers.values_mut() {
            w.flush()?;
        }
        debug!(channel = channel.name(), written, "channel flushed");
        Ok(written)
    })
}

/// Download each item's image into its brand's image directory. Failures are
/// logged and skipped; returns the number of images saved.
pub fn spawn_image_sink(
    client: Client,
    image_dirs: HashMap<String, PathBuf>,
    mut rx: mpsc::Receiver<Arc<RoutedItem>>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut saved = 0usize;
        while let Some(item) = rx.recv().await {
            let Some(task) = &item.image else { continue };
            let Some(dir) = image_dirs.get(&item.brand) else { continue };
            match download(&client, task, dir).await {
                Ok(path) => {
                    saved += 1;
                    debug!(file = %task.file_name, path = %path.display(), "image saved");
                }
                Err(e) => warn!(url = %task.url, item = %item.item, "image skipped: {}", e),
            }
        }
        saved
    })
}

async fn download(client: &Client, task: &ImageTask, dir: &Path) -> anyhow::Result<PathBuf> {
    let bytes = client
        .get(&task.url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let path = dir.join(&task.local_name);
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

/// Append-only `brand,item` log of rows that could not be fetched.
pub struct ErrorLog {
    writer: csv::Writer<File>,
}

impl ErrorLog {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self { writer })
    }

    /// Written through immediately so the log survives an aborted run.
    pub fn append(&mut self, brand: &str, item: &str) -> Result<(), SinkError> {
        self.writer.write_record([brand, item])?;
        self.writer.flush()?;
        Ok(())
    }
}
