use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("yt-dlp binary not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to list playlist tracks: {0}")]
    EnumerationFailed(String),

    #[error("No tracks found in playlist: {0}")]
    NoTracksFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Concurrency gate closed")]
    GateClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl DownloaderError {
    /// Errors that abort a batch before any track is attempted.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            DownloaderError::ToolNotFound(_)
                | DownloaderError::EnumerationFailed(_)
                | DownloaderError::NoTracksFound(_)
        )
    }
}
