use crate::error::DownloaderError;
use crate::types::{BatchRequest, DownloaderConfig, DEFAULT_AUDIO_QUALITY, DEFAULT_PARALLELISM};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download every track of a playlist with yt-dlp", long_about = None)]
pub struct Cli {
    /// Playlist URL
    pub url: String,

    /// Playlist name, used as the subdirectory for its tracks
    #[arg(short, long)]
    pub name: String,

    /// Root directory for downloads
    #[arg(short, long, default_value = "./downloads")]
    pub output_dir: PathBuf,

    /// Preferred audio format, tried before the wav/opus/mp3 fallbacks
    #[arg(short, long)]
    pub format: Option<String>,

    /// Number of concurrent track downloads
    #[arg(short, long, default_value_t = DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    /// Path to the yt-dlp binary (default: bundled bin/ directory, then PATH)
    #[arg(long = "yt-dlp")]
    pub yt_dlp: Option<PathBuf>,

    /// yt-dlp --audio-quality value
    #[arg(long, default_value = DEFAULT_AUDIO_QUALITY)]
    pub audio_quality: String,

    /// Directory containing ffmpeg and ffprobe
    #[arg(long)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Write a per-track CSV report to this path
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    pub fn validate(&self) -> Result<(), DownloaderError> {
        if self.url.trim().is_empty() {
            return Err(DownloaderError::InvalidInput("playlist URL is required".into()));
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DownloaderError::InvalidInput("playlist name is required".into()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DownloaderError::InvalidInput(format!(
                "playlist name must be a plain directory name: {}",
                name
            )));
        }
        Ok(())
    }

    pub fn request(&self) -> BatchRequest {
        BatchRequest {
            source_url: self.url.trim().to_string(),
            destination_root: self.output_dir.clone(),
            batch_name: self.name.trim().to_string(),
            user_format: self.format.as_deref().unwrap_or_default().trim().to_string(),
        }
    }

    pub fn config(&self) -> DownloaderConfig {
        DownloaderConfig {
            parallelism: self.parallelism,
            audio_quality: self.audio_quality.clone(),
            ffmpeg_location: self.ffmpeg_location.clone(),
        }
    }
}
