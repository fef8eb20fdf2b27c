use serde::{Deserialize, Serialize};

use crate::{job::BatchJob, types::JobStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub queued: usize,
    pub running: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchStats {
    pub fn record(&mut self, job: &BatchJob) {
        self.total += 1;
        match job.status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Paused => self.paused += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn active(&self) -> usize {
        self.queued + self.running + self.paused
    }
}

impl<'a> FromIterator<&'a BatchJob> for BatchStats {
    fn from_iter<I: IntoIterator<Item = &'a BatchJob>>(jobs: I) -> Self {
        let mut stats = Self::default();
        for job in jobs {
            stats.record(job);
        }
        stats
    }
}
