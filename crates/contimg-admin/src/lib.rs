pub mod handlers;
pub mod router;
pub mod types;

use std::time::Instant;

use chrono::{DateTime, Utc};
use contimg_batch::BatchJobStore;

pub struct AdminSys {
    store: BatchJobStore,
    started_at: Instant,
    boot_time: DateTime<Utc>,
}

impl AdminSys {
    pub fn new(store: BatchJobStore) -> Self {
        Self {
            store,
            started_at: Instant::now(),
            boot_time: Utc::now(),
        }
    }

    pub fn store(&self) -> &BatchJobStore {
        &self.store
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn boot_time(&self) -> DateTime<Utc> {
        self.boot_time
    }
}
