//! Seams to the external extraction tool, and their yt-dlp implementations.

use crate::error::DownloaderError;
use crate::parser::parse_playlist_json;
use crate::types::AttemptResult;
use async_trait::async_trait;
use log::{debug, error};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Turns a playlist URL into the ordered list of its track URLs.
#[async_trait]
pub trait TrackEnumerator: Send + Sync {
    async fn list(&self, binary: &Path, source_url: &str) -> Result<Vec<String>, DownloaderError>;
}

/// Performs one (url, format) download.
#[async_trait]
pub trait ExtractionInvoker: Send + Sync {
    async fn invoke(&self, request: &InvocationRequest) -> AttemptResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub binary: PathBuf,
    pub url: String,
    pub format: String,
    pub quality: String,
    pub aux_dir: Option<PathBuf>,
    pub output_template: PathBuf,
}

impl InvocationRequest {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-x".to_string(),
            "--audio-format".to_string(),
            self.format.clone(),
            "--audio-quality".to_string(),
            self.quality.clone(),
        ];
        if let Some(dir) = &self.aux_dir {
            args.push("--ffmpeg-location".to_string());
            args.push(dir.display().to_string());
        }
        args.push("-o".to_string());
        args.push(self.output_template.display().to_string());
        args.push(self.url.clone());
        args
    }
}

/// `<dir>/%(title)s.%(ext)s`
pub fn output_template(destination: &Path) -> PathBuf {
    destination.join("%(title)s.%(ext)s")
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}

#[derive(Debug, Default, Clone)]
pub struct YtDlp;

impl YtDlp {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrackEnumerator for YtDlp {
    async fn list(&self, binary: &Path, source_url: &str) -> Result<Vec<String>, DownloaderError> {
        debug!("Listing tracks for {}", source_url);
        let output = Command::new(binary)
            .args(["--flat-playlist", "--no-warnings", "-J", source_url])
            .output()
            .await
            .map_err(|e| {
                DownloaderError::EnumerationFailed(format!("Failed to execute yt-dlp: {}", e))
            })?;

        if !output.status.success() {
            let text = combined_output(&output.stdout, &output.stderr);
            error!("yt-dlp listing failed: {}\nOutput: {}", output.status, text);
            return Err(DownloaderError::EnumerationFailed(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                text.trim()
            )));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_playlist_json(&json)
            .map_err(|e| DownloaderError::EnumerationFailed(format!("Malformed listing: {}", e)))
    }
}

#[async_trait]
impl ExtractionInvoker for YtDlp {
    async fn invoke(&self, request: &InvocationRequest) -> AttemptResult {
        let output = Command::new(&request.binary)
            .args(request.args())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => AttemptResult::Success,
            Ok(output) => AttemptResult::Failed(format!(
                "{}\nOutput: {}",
                output.status,
                combined_output(&output.stdout, &output.stderr)
            )),
            Err(e) => AttemptResult::Failed(format!("Failed to execute yt-dlp: {}", e)),
        }
    }
}
