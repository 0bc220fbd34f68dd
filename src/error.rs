use thiserror::Error;

/// Fatal, run-level errors. Any of these stops the run before (or instead of)
/// processing rows.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported brand: {0}")]
    UnsupportedBrand(String),

    #[error("Failed to read input list: {0}")]
    Input(#[from] csv::Error),

    #[error("Failed to prepare output location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid site base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a catalogue lookup did not produce a page. Never leaves the fetcher:
/// every variant is folded into `FetchResult::Failed`.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no search match")]
    NoMatch,

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}
