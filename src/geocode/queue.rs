use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::geocode::job::GeocodeJob;
use crate::geocode::provider::GeocodeProvider;
use crate::requests::store::RequestStore;

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF_MS: u64 = 250;

/// Low-priority background lane for geocode jobs. Delivery is at-least-once:
/// the same id may be queued several times in rapid succession and each
/// execution re-reads current state, so redundancy is harmless.
#[derive(Clone)]
pub struct GeocodeQueue {
    tx: mpsc::UnboundedSender<GeocodeJob>,
}

impl GeocodeQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GeocodeJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a job to the worker immediately. Write paths should prefer
    /// deferring through a [`DispatchScope`] so a worker never re-reads a
    /// write that might still roll back.
    pub fn dispatch(&self, job: GeocodeJob) {
        if self.tx.send(job).is_err() {
            error!(
                "Geocode worker is gone, dropping job for request {}",
                job.request_id
            );
        }
    }
}

/// Post-commit callback list attached to one write cycle. Jobs deferred here
/// become visible to the worker only when `commit` runs, which the write path
/// calls after its save has durably landed. Dropping the scope without
/// committing discards the jobs, which is exactly right for a failed write.
#[derive(Default)]
pub struct DispatchScope {
    deferred: Vec<GeocodeJob>,
}

impl DispatchScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, job: GeocodeJob) {
        self.deferred.push(job);
    }

    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty()
    }

    pub fn commit(self, queue: &GeocodeQueue) {
        for job in self.deferred {
            queue.dispatch(job);
        }
    }
}

/// Worker loop draining the geocode queue, decoupled from the request path.
pub struct GeocodeWorker {
    store: Arc<dyn RequestStore>,
    provider: Arc<dyn GeocodeProvider>,
}

impl GeocodeWorker {
    pub fn new(store: Arc<dyn RequestStore>, provider: Arc<dyn GeocodeProvider>) -> Self {
        Self { store, provider }
    }

    pub fn start(self, mut rx: mpsc::UnboundedReceiver<GeocodeJob>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("⚙️  Geocode worker started");
            while let Some(job) = rx.recv().await {
                self.run_with_retry(job).await;
            }
            info!("Geocode worker stopped: queue closed");
        })
    }

    /// Transient failures retry with exponential backoff; anything else is
    /// logged and the job dropped. A provider failure must never take the
    /// worker down with it.
    async fn run_with_retry(&self, job: GeocodeJob) {
        for attempt in 1..=MAX_ATTEMPTS {
            match job.run(self.store.as_ref(), self.provider.as_ref()).await {
                Ok(()) => return,
                Err(e) if Self::is_retryable(&e) && attempt < MAX_ATTEMPTS => {
                    let backoff =
                        Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt - 1));
                    warn!(
                        "Geocode attempt {}/{} for request {} failed: {}, retrying in {:?}",
                        attempt, MAX_ATTEMPTS, job.request_id, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!(
                        "❌ Geocode job for request {} abandoned: {}",
                        job.request_id, e
                    );
                    return;
                }
            }
        }
    }

    fn is_retryable(error: &AppError) -> bool {
        match error {
            AppError::Geocode(e) => e.is_transient(),
            AppError::Database(_) => true,
            _ => false,
        }
    }
}
