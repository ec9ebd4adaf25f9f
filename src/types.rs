use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Formats tried after the user's choice, in order.
pub const FALLBACK_FORMATS: [&str; 3] = ["wav", "opus", "mp3"];

pub const DEFAULT_PARALLELISM: usize = 3;
pub const DEFAULT_AUDIO_QUALITY: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub index: usize,
    pub url: String,
}

impl Item {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }

    /// 1-based position, as shown to users.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Ordered formats to try for every track of a batch. Never empty, never repeats a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPreferenceList {
    formats: Vec<String>,
}

impl FormatPreferenceList {
    pub fn new(user_format: &str) -> Self {
        let user_format = user_format.trim();
        let mut formats = Vec::with_capacity(FALLBACK_FORMATS.len() + 1);
        if !user_format.is_empty() {
            formats.push(user_format.to_string());
        }
        for fallback in FALLBACK_FORMATS {
            if !fallback.eq_ignore_ascii_case(user_format) {
                formats.push(fallback.to_string());
            }
        }
        Self { formats }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(String::as_str)
    }
}

#[cfg(test)]
impl FormatPreferenceList {
    pub fn from_formats(formats: &[&str]) -> Self {
        assert!(!formats.is_empty());
        Self {
            formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Success,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item: Item,
    pub diagnostic: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track {}: {} (Error: {})",
            self.item.number(),
            self.item.url,
            self.diagnostic
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded { item: Item, format: String },
    Exhausted(ItemFailure),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Downloaded { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Counts one more finished track and returns the new completed count.
    pub fn advance(&mut self) -> usize {
        self.completed += 1;
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedTrack {
    pub item: Item,
    pub format: String,
}

#[derive(Debug)]
pub struct BatchReport {
    pub batch_name: String,
    pub destination: PathBuf,
    pub total: usize,
    pub downloaded: Vec<DownloadedTrack>,
    pub failures: Vec<ItemFailure>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded_count(&self) -> usize {
        self.downloaded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub source_url: String,
    pub destination_root: PathBuf,
    pub batch_name: String,
    pub user_format: String,
}

impl BatchRequest {
    pub fn destination_dir(&self) -> PathBuf {
        destination_dir(&self.destination_root, &self.batch_name)
    }
}

pub fn destination_dir(root: &Path, batch_name: &str) -> PathBuf {
    root.join(batch_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLocation {
    pub binary: PathBuf,
    /// Passed to yt-dlp as `--ffmpeg-location` when set.
    pub aux_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub parallelism: usize,
    pub audio_quality: String,
    pub ffmpeg_location: Option<PathBuf>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
            ffmpeg_location: None,
        }
    }
}
