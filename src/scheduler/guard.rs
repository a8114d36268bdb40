//! Per-job mutual exclusion

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-permit semaphore held for the duration of one pass
#[derive(Debug, Clone)]
pub struct JobGuard {
    permits: Arc<Semaphore>,
}

impl JobGuard {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the permit if no pass is running
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().try_acquire_owned().ok()
    }
}

impl Default for JobGuard {
    fn default() -> Self {
        Self::new()
    }
}
