use serde::Serialize;

use crate::types::{ItemStatus, JobStatus};

/// State changes published by the store to its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    JobSubmitted {
        job_id: String,
    },
    JobStatusChanged {
        job_id: String,
        status: JobStatus,
    },
    ItemStarted {
        job_id: String,
        item_id: String,
    },
    ItemSettled {
        job_id: String,
        item_id: String,
        status: ItemStatus,
        progress: u8,
    },
    JobRemoved {
        job_id: String,
    },
    SelectionChanged {
        job_id: Option<String>,
    },
}
