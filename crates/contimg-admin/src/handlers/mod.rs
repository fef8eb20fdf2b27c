pub mod batch;
pub mod health;
pub mod info;

use axum::{Json, http::StatusCode, response::IntoResponse};
use contimg_common::error::OpsError;
use tracing::{debug, error};

pub struct AdminApiError(pub OpsError);

impl From<OpsError> for AdminApiError {
    fn from(value: OpsError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        if self.0.is_rejected_command() {
            debug!(error = %self.0, "admin request rejected");
        } else {
            error!(error = %self.0, "admin request failed");
        }

        let status = match self.0 {
            OpsError::JobNotFound(_) => StatusCode::NOT_FOUND,
            OpsError::InvalidState { .. } => StatusCode::CONFLICT,
            OpsError::InvalidArgument(_) | OpsError::OperationNotRegistered(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(serde_json::json!({
                "code": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
