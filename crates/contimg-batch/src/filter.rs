use serde::{Deserialize, Serialize};

use crate::{
    job::BatchJob,
    types::{JobStatus, OperationType},
};

/// Selector arguments for listing jobs. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    /// Case-insensitive substring of the job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &BatchJob) -> bool {
        if self.status.is_some_and(|status| status != job.status) {
            return false;
        }
        if self
            .operation_type
            .is_some_and(|operation_type| operation_type != job.operation_type)
        {
            return false;
        }
        if let Some(submitted_by) = self.submitted_by.as_deref()
            && !submitted_by.is_empty()
            && submitted_by != job.submitted_by
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
            && !job.name.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}
