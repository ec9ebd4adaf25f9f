//! Fakes shared by unit tests.

use crate::error::DownloaderError;
use crate::extractor::{ExtractionInvoker, InvocationRequest, TrackEnumerator};
use crate::observer::{Observer, ObserverEvent};
use crate::tool::ToolLocator;
use crate::types::{AttemptResult, ToolLocation};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn tool_location() -> ToolLocation {
    ToolLocation {
        binary: PathBuf::from("/opt/groove/bin/yt-dlp_linux"),
        aux_dir: Some(PathBuf::from("/opt/groove/bin")),
    }
}

pub struct FakeLocator {
    found: bool,
}

impl FakeLocator {
    pub fn found() -> Self {
        Self { found: true }
    }

    pub fn missing() -> Self {
        Self { found: false }
    }
}

impl ToolLocator for FakeLocator {
    fn locate(&self) -> Result<ToolLocation, DownloaderError> {
        if self.found {
            Ok(tool_location())
        } else {
            Err(DownloaderError::ToolNotFound("not installed".into()))
        }
    }
}

pub struct FakeEnumerator {
    result: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl FakeEnumerator {
    pub fn tracks(urls: &[&str]) -> Self {
        Self {
            result: Ok(urls.iter().map(|u| u.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackEnumerator for FakeEnumerator {
    async fn list(&self, _binary: &Path, _source_url: &str) -> Result<Vec<String>, DownloaderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(DownloaderError::EnumerationFailed)
    }
}

/// Invoker that succeeds only for configured (url, format) pairs, and records
/// every request plus the peak number of overlapping invocations.
#[derive(Default)]
pub struct ScriptedInvoker {
    successes: HashMap<String, Vec<String>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<InvocationRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, url: &str, format: &str) -> Self {
        self.successes
            .entry(url.to_string())
            .or_default()
            .push(format.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn formats_tried(&self, url: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .map(|r| r.format)
            .collect()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> AttemptResult {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let ok = self
            .successes
            .get(&request.url)
            .is_some_and(|formats| formats.contains(&request.format));
        if ok {
            AttemptResult::Success
        } else {
            AttemptResult::Failed(format!(
                "ERROR: {} unavailable for {}",
                request.format, request.url
            ))
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObserverEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Progress { current, total } => Some((current, total)),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn on_status(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ObserverEvent::Status(message.to_string()));
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(ObserverEvent::Progress { current, total });
    }
}
