use crate::error::DownloaderError;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission control bounding how many tracks download at once.
///
/// Capacity is fixed for the gate's lifetime. Slots are handed out as
/// [`GatePermit`]s and freed when the permit is dropped, on every exit path.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn acquire(&self) -> Result<GatePermit, DownloaderError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DownloaderError::GateClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        debug!("Gate slot acquired ({}/{} in flight)", now, self.capacity);

        Ok(GatePermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held permits seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A reserved gate slot. The slot is released when this value is dropped.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // runs before the semaphore permit field is released
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(ConcurrencyGate::new(0).capacity(), 1);
        assert_eq!(ConcurrencyGate::new(3).capacity(), 3);
    }

    #[tokio::test]
    async fn dropping_permit_frees_slot() {
        let gate = ConcurrencyGate::new(1);
        let permit = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(blocked.is_err(), "second acquire should wait for a free slot");

        drop(permit);
        assert_eq!(gate.in_flight(), 0);
        let _again = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn slot_released_when_guarded_work_fails() {
        let gate = ConcurrencyGate::new(1);

        async fn failing(gate: &ConcurrencyGate) -> Result<(), DownloaderError> {
            let _permit = gate.acquire().await?;
            Err(DownloaderError::InvalidInput("boom".into()))
        }

        assert!(failing(&gate).await.is_err());
        assert_eq!(gate.in_flight(), 0);
        let _permit = gate.acquire().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn peak_never_exceeds_capacity() {
        let gate = Arc::new(ConcurrencyGate::new(3));
        let mut handles = Vec::new();

        for _ in 0..10 {
            let permit = gate.acquire().await.unwrap();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(gate.peak() <= 3, "peak was {}", gate.peak());
        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
    }
}
