//! Status and progress delivery for a running batch.
//!
//! The downloader reports from many tasks at once. [`QueuedObserver`] funnels
//! those calls through a channel onto one delivery task, so the sink it wraps
//! only ever sees one call at a time and in arrival order.

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub trait Observer: Send + Sync {
    fn on_status(&self, message: &str);
    fn on_progress(&self, current: usize, total: usize);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Status(String),
    Progress { current: usize, total: usize },
}

pub struct QueuedObserver {
    sender: mpsc::UnboundedSender<ObserverEvent>,
}

impl QueuedObserver {
    /// Starts the delivery task. It finishes once every `QueuedObserver` is dropped
    /// and all queued events have reached `sink`.
    pub fn spawn<O>(sink: O) -> (Self, JoinHandle<()>)
    where
        O: Observer + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    ObserverEvent::Status(message) => sink.on_status(&message),
                    ObserverEvent::Progress { current, total } => sink.on_progress(current, total),
                }
            }
            debug!("Observer delivery task finished");
        });
        (Self { sender }, handle)
    }

    fn send(&self, event: ObserverEvent) {
        // receiver only goes away after all senders are dropped
        let _ = self.sender.send(event);
    }
}

impl Observer for QueuedObserver {
    fn on_status(&self, message: &str) {
        self.send(ObserverEvent::Status(message.to_string()));
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.send(ObserverEvent::Progress { current, total });
    }
}

/// Adapts a pair of closures to [`Observer`].
pub struct CallbackObserver<S, P> {
    on_status: S,
    on_progress: P,
}

impl<S, P> CallbackObserver<S, P>
where
    S: Fn(&str) + Send + Sync,
    P: Fn(usize, usize) + Send + Sync,
{
    pub fn new(on_status: S, on_progress: P) -> Self {
        Self {
            on_status,
            on_progress,
        }
    }
}

impl<S, P> Observer for CallbackObserver<S, P>
where
    S: Fn(&str) + Send + Sync,
    P: Fn(usize, usize) + Send + Sync,
{
    fn on_status(&self, message: &str) {
        (self.on_status)(message)
    }

    fn on_progress(&self, current: usize, total: usize) {
        (self.on_progress)(current, total)
    }
}

pub struct ProgressBarObserver {
    pb: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tracks {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message("Ready to start downloading...");
        Self { pb }
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.pb
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressBarObserver {
    fn on_status(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(current as u64);
        if total > 0 && current >= total {
            self.pb.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn queued_events_arrive_in_order() {
        let recorder = RecordingObserver::new();
        let (observer, delivery) = QueuedObserver::spawn(recorder.clone());

        observer.on_status("Starting downloads...");
        observer.on_progress(0, 2);
        observer.on_progress(1, 2);
        observer.on_progress(2, 2);
        drop(observer);
        delivery.await.unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                ObserverEvent::Status("Starting downloads...".into()),
                ObserverEvent::Progress { current: 0, total: 2 },
                ObserverEvent::Progress { current: 1, total: 2 },
                ObserverEvent::Progress { current: 2, total: 2 },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_senders_are_all_delivered() {
        let recorder = RecordingObserver::new();
        let (observer, delivery) = QueuedObserver::spawn(recorder.clone());
        let observer = Arc::new(observer);

        let mut handles = Vec::new();
        for i in 0..8 {
            let observer = observer.clone();
            handles.push(tokio::spawn(async move {
                observer.on_progress(i, 8);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        drop(observer);
        delivery.await.unwrap();

        assert_eq!(recorder.progress().len(), 8);
    }

    #[test]
    fn callback_observer_forwards_calls() {
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let last_progress = Arc::new(AtomicUsize::new(0));

        let observer = {
            let statuses = statuses.clone();
            let last_progress = last_progress.clone();
            CallbackObserver::new(
                move |msg: &str| statuses.lock().unwrap().push(msg.to_string()),
                move |current, _total| last_progress.store(current, Ordering::SeqCst),
            )
        };

        observer.on_status("hello");
        observer.on_progress(4, 5);

        assert_eq!(*statuses.lock().unwrap(), vec!["hello".to_string()]);
        assert_eq!(last_progress.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn progress_bar_tracks_counts() {
        let observer = ProgressBarObserver::new();
        observer.on_progress(0, 3);
        observer.on_progress(2, 3);
        assert_eq!(observer.progress_bar().length(), Some(3));
        assert_eq!(observer.progress_bar().position(), 2);
        observer.on_progress(3, 3);
        assert!(observer.progress_bar().is_finished());
    }
}
