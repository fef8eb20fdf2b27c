use chrono::{DateTime, Utc};
use contimg_batch::{
    BatchJob, BatchStats, ItemFailurePolicy, JobParams, NewBatchItem, OperationType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    pub name: String,
    pub operation_type: OperationType,
    pub items: Vec<NewBatchItem>,
    #[serde(default)]
    pub params: JobParams,
    pub submitted_by: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<BatchJob>,
    pub stats: BatchStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearCompletedResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub job_id: Option<String>,
    pub job: Option<BatchJob>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    pub version: String,
    pub uptime_seconds: u64,
    pub boot_time: DateTime<Utc>,
    pub concurrency: usize,
    pub failure_policy: ItemFailurePolicy,
    pub active_jobs: usize,
    pub operations: Vec<OperationType>,
}
