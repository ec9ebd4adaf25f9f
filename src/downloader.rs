use crate::attempt::AttemptRunner;
use crate::error::DownloaderError;
use crate::extractor::{ExtractionInvoker, TrackEnumerator};
use crate::gate::ConcurrencyGate;
use crate::observer::Observer;
use crate::tool::ToolLocator;
use crate::types::{
    BatchProgress, BatchReport, BatchRequest, DownloadedTrack, DownloaderConfig,
    FormatPreferenceList, Item, ItemFailure, ItemOutcome, ToolLocation,
};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared state of a running batch, only touched under its mutex.
#[derive(Debug, Default)]
struct BatchState {
    progress: BatchProgress,
    downloaded: Vec<DownloadedTrack>,
    failures: Vec<ItemFailure>,
    recorded: HashSet<usize>,
}

impl BatchState {
    fn new(total: usize) -> Self {
        Self {
            progress: BatchProgress::new(total),
            ..Default::default()
        }
    }

    /// Records a finished track and returns the new completed count.
    fn record(&mut self, outcome: ItemOutcome) -> usize {
        match &outcome {
            ItemOutcome::Downloaded { item, .. } => self.recorded.insert(item.index),
            ItemOutcome::Exhausted(failure) => self.recorded.insert(failure.item.index),
        };
        match outcome {
            ItemOutcome::Downloaded { item, format } => {
                self.downloaded.push(DownloadedTrack { item, format })
            }
            ItemOutcome::Exhausted(failure) => {
                error!("Error downloading track {}: {}", failure.item.number(), failure.diagnostic);
                self.failures.push(failure);
            }
        }
        self.progress.advance()
    }

    fn is_recorded(&self, item: &Item) -> bool {
        self.recorded.contains(&item.index)
    }
}

pub struct Downloader {
    config: DownloaderConfig,
    locator: Arc<dyn ToolLocator>,
    enumerator: Arc<dyn TrackEnumerator>,
    invoker: Arc<dyn ExtractionInvoker>,
}

impl Downloader {
    pub fn new(
        config: DownloaderConfig,
        locator: Arc<dyn ToolLocator>,
        enumerator: Arc<dyn TrackEnumerator>,
        invoker: Arc<dyn ExtractionInvoker>,
    ) -> Self {
        Self {
            config,
            locator,
            enumerator,
            invoker,
        }
    }

    /// Downloads every track of `request.source_url` into `request.destination_dir()`.
    ///
    /// Fails only when nothing can be attempted (tool missing, listing failed or
    /// empty, destination not creatable). Tracks that exhaust every format are
    /// reported in the returned [`BatchReport`] instead.
    pub async fn run(
        &self,
        request: &BatchRequest,
        observer: Arc<dyn Observer>,
    ) -> Result<BatchReport, DownloaderError> {
        let start_time = Instant::now();

        let tool = match self.locate_tool() {
            Ok(tool) => tool,
            Err(e) => {
                observer.on_status("Error: Failed to locate yt-dlp binary");
                error!("Error locating yt-dlp binary: {}", e);
                return Err(e);
            }
        };
        info!("Using yt-dlp binary: {}", tool.binary.display());

        observer.on_status("Listing tracks...");
        let urls = match self.enumerator.list(&tool.binary, &request.source_url).await {
            Ok(urls) => urls,
            Err(e) => {
                observer.on_status("Error: Failed to extract playlist tracks");
                error!("Error extracting tracks: {}", e);
                return Err(e);
            }
        };
        if urls.is_empty() {
            observer.on_status("Error: No tracks found in playlist");
            error!("No tracks found for playlist: {}", request.source_url);
            return Err(DownloaderError::NoTracksFound(request.source_url.clone()));
        }
        info!("Found {} tracks in playlist {}", urls.len(), request.batch_name);

        let formats = Arc::new(FormatPreferenceList::new(&request.user_format));
        debug!(
            "Format preference: {}",
            formats.iter().collect::<Vec<_>>().join(", ")
        );

        let destination = Arc::new(request.destination_dir());
        if let Err(e) = tokio::fs::create_dir_all(destination.as_path()).await {
            observer.on_status("Error: Could not create download directory");
            error!("Failed to create directory {}: {}", destination.display(), e);
            return Err(e.into());
        }
        info!("Using playlist directory: {}", destination.display());

        let items: Vec<Item> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| Item::new(index, url))
            .collect();
        let total = items.len();
        let state = Arc::new(Mutex::new(BatchState::new(total)));

        observer.on_progress(0, total);
        observer.on_status("Starting downloads...");

        let runner = Arc::new(AttemptRunner::new(
            self.invoker.clone(),
            tool,
            self.config.audio_quality.clone(),
        ));
        let gate = ConcurrencyGate::new(self.config.parallelism);

        let mut launched = Vec::with_capacity(total);
        for item in items {
            let permit = gate.acquire().await?;
            let runner = runner.clone();
            let formats = formats.clone();
            let destination = destination.clone();
            let state = state.clone();
            let observer = observer.clone();
            let task_item = item.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                info!("Downloading track {}/{}: {}", task_item.number(), total, task_item.url);

                let outcome = runner.resolve(&task_item, &formats, &destination).await;

                let mut state = state.lock().await;
                let completed = state.record(outcome);
                observer.on_progress(completed, total);
            });
            launched.push((item, handle));
        }

        let (items, handles): (Vec<_>, Vec<_>) = launched.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        for (item, result) in items.into_iter().zip(results) {
            if let Err(e) = result {
                let mut state = state.lock().await;
                if state.is_recorded(&item) {
                    warn!("Task for track {} failed after recording its outcome: {}", item.number(), e);
                    continue;
                }
                let completed = state.record(ItemOutcome::Exhausted(ItemFailure {
                    item,
                    diagnostic: format!("download task aborted: {}", e),
                }));
                observer.on_progress(completed, total);
            }
        }
        debug!(
            "Peak concurrent downloads: {}/{} ({} still in flight)",
            gate.peak(),
            gate.capacity(),
            gate.in_flight()
        );

        let mut state = std::mem::take(&mut *state.lock().await);
        debug_assert_eq!(state.progress.completed, total);
        state.downloaded.sort_by_key(|d| d.item.index);
        state.failures.sort_by_key(|f| f.item.index);

        let report = BatchReport {
            batch_name: request.batch_name.clone(),
            destination: (*destination).clone(),
            total,
            downloaded: state.downloaded,
            failures: state.failures,
            duration: start_time.elapsed(),
        };

        if report.is_success() {
            observer.on_status(&format!(
                "All tracks for playlist {} downloaded successfully!",
                request.batch_name
            ));
            info!("All tracks for playlist {} downloaded successfully.", request.batch_name);
        } else {
            observer.on_status(&format!(
                "Downloaded with {} failures. Check logs.",
                report.failed_count()
            ));
            for failure in &report.failures {
                warn!("Failed to download {}", failure);
            }
        }

        Ok(report)
    }

    fn locate_tool(&self) -> Result<ToolLocation, DownloaderError> {
        let mut tool = self.locator.locate()?;
        if let Some(dir) = &self.config.ffmpeg_location {
            tool.aux_dir = Some(dir.clone());
        }
        Ok(tool)
    }
}
