use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{ItemFailurePolicy, ItemStatus, JobStatus, OperationType};

/// Caller-supplied description of one item in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatchItem {
    pub id: String,
    pub name: String,
}

impl NewBatchItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: String,
    pub name: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<NewBatchItem> for BatchItem {
    fn from(item: NewBatchItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            status: ItemStatus::Pending,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Operation parameters shared by every item of a job, forwarded unchanged to
/// the item operation.
pub type JobParams = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub id: String,
    pub name: String,
    pub operation_type: OperationType,
    pub status: JobStatus,
    pub items: Vec<BatchItem>,
    #[serde(default)]
    pub params: JobParams,
    pub progress: u8,
    pub completed_count: usize,
    pub failed_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub submitted_by: String,
}

impl BatchJob {
    pub fn skipped_count(&self) -> usize {
        self.count_items(ItemStatus::Skipped)
    }

    pub fn pending_count(&self) -> usize {
        self.count_items(ItemStatus::Pending)
    }

    pub fn processing_count(&self) -> usize {
        self.count_items(ItemStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// A job that failed with a job-level error stopped on a runner defect and
    /// needs a fresh submission.
    pub fn is_fatal(&self) -> bool {
        self.status == JobStatus::Failed && self.error.is_some()
    }

    pub fn can_retry(&self) -> bool {
        self.is_terminal() && self.failed_count > 0 && !self.is_fatal()
    }

    pub fn item(&self, item_id: &str) -> Option<&BatchItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: &str) -> Option<&mut BatchItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.items.iter().all(|item| item.status.is_terminal())
    }

    /// Recomputes counts and progress from item states.
    pub(crate) fn refresh_counts(&mut self) {
        self.completed_count = self.count_items(ItemStatus::Completed);
        self.failed_count = self.count_items(ItemStatus::Failed);
        let settled = self.completed_count + self.failed_count + self.skipped_count();
        self.progress = progress_percent(settled, self.items.len());
    }

    pub(crate) fn drained_status(&self, policy: ItemFailurePolicy) -> JobStatus {
        match policy {
            ItemFailurePolicy::FailJob if self.failed_count > 0 => JobStatus::Failed,
            _ => JobStatus::Completed,
        }
    }

    pub(crate) fn skip_unfinished(
        &mut self,
        now: DateTime<Utc>,
        include_processing: bool,
    ) -> usize {
        let mut skipped = 0;
        for item in &mut self.items {
            let eligible = item.status == ItemStatus::Pending
                || (include_processing && item.status == ItemStatus::Processing);
            if eligible {
                item.status = ItemStatus::Skipped;
                item.completed_at = Some(now);
                skipped += 1;
            }
        }
        skipped
    }

    fn count_items(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }
}

pub(crate) fn progress_percent(settled: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((settled.min(total) * 100) / total) as u8
}
