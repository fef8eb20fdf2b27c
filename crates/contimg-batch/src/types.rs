use std::{fmt, str::FromStr};

use contimg_common::error::OpsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = OpsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(OpsError::InvalidArgument(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Operations the dashboard can apply to a selection of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Delete,
    Export,
    Reprocess,
    Calibrate,
    Image,
    Convert,
    Publish,
    Photometry,
    EseDetect,
}

impl OperationType {
    pub const ALL: [OperationType; 9] = [
        Self::Delete,
        Self::Export,
        Self::Reprocess,
        Self::Calibrate,
        Self::Image,
        Self::Convert,
        Self::Publish,
        Self::Photometry,
        Self::EseDetect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Reprocess => "reprocess",
            Self::Calibrate => "calibrate",
            Self::Image => "image",
            Self::Convert => "convert",
            Self::Publish => "publish",
            Self::Photometry => "photometry",
            Self::EseDetect => "ese_detect",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = OpsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|operation| operation.as_str() == normalized)
            .ok_or_else(|| OpsError::InvalidArgument(format!("unknown operation type: {value}")))
    }
}

/// How a drained job resolves when some of its items failed.
///
/// `Complete` finishes the job as completed and leaves the failures in
/// `failed_count`. `FailJob` marks the job failed, without a job-level error,
/// so it stays retryable. A job-level `error` is only ever set by a fatal
/// runner failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailurePolicy {
    #[default]
    Complete,
    FailJob,
}

impl FromStr for ItemFailurePolicy {
    type Err = OpsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "complete" => Ok(Self::Complete),
            "fail_job" | "fail" => Ok(Self::FailJob),
            other => Err(OpsError::InvalidArgument(format!(
                "unknown item failure policy: {other}"
            ))),
        }
    }
}
