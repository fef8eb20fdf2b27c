use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("batch job not found: {0}")]
    JobNotFound(String),
    #[error("cannot {action} job {job_id} while it is {status}")]
    InvalidState {
        job_id: String,
        status: String,
        action: &'static str,
    },
    #[error("no operation registered for {0}")]
    OperationNotRegistered(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl OpsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::JobNotFound(_) => "NoSuchJob",
            Self::InvalidState { .. } => "InvalidJobState",
            Self::OperationNotRegistered(_) => "OperationNotRegistered",
            Self::OperationFailed(_) => "OperationFailed",
            Self::InternalError(_) => "InternalError",
        }
    }

    /// Whether the caller's request was refused, as opposed to the engine
    /// failing while serving it.
    pub fn is_rejected_command(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::JobNotFound(_)
                | Self::InvalidState { .. }
                | Self::OperationNotRegistered(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;
