use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AdminSys, handlers};

pub fn admin_api_router(admin: Arc<AdminSys>) -> Router {
    Router::new()
        .route("/health/live", get(handlers::health::health_live))
        .route("/api/v1/info", get(handlers::info::server_info))
        .route(
            "/api/v1/batch/jobs",
            get(handlers::batch::list_batch_jobs).post(handlers::batch::submit_batch_job),
        )
        .route(
            "/api/v1/batch/jobs/{job_id}",
            get(handlers::batch::get_batch_job),
        )
        .route(
            "/api/v1/batch/jobs/{job_id}/cancel",
            post(handlers::batch::cancel_batch_job),
        )
        .route(
            "/api/v1/batch/jobs/{job_id}/pause",
            post(handlers::batch::pause_batch_job),
        )
        .route(
            "/api/v1/batch/jobs/{job_id}/resume",
            post(handlers::batch::resume_batch_job),
        )
        .route(
            "/api/v1/batch/jobs/{job_id}/retry",
            post(handlers::batch::retry_batch_job),
        )
        .route(
            "/api/v1/batch/clear-completed",
            post(handlers::batch::clear_completed_jobs),
        )
        .route("/api/v1/batch/stats", get(handlers::batch::batch_stats))
        .route(
            "/api/v1/batch/selection",
            get(handlers::batch::get_selection).put(handlers::batch::set_selection),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(admin)
}
