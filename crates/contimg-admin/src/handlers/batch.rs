use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use contimg_batch::{BatchJob, BatchStats, JobFilter};
use contimg_common::error::OpsError;
use tracing::debug;

use crate::{
    AdminSys,
    handlers::AdminApiError,
    types::{
        ClearCompletedResponse, JobListResponse, SelectionRequest, SelectionResponse,
        SubmitJobRequest,
    },
};

pub async fn submit_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Json(payload): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<BatchJob>), AdminApiError> {
    let store = admin.store();
    let job_id = store.submit_with_params(
        payload.name,
        payload.operation_type,
        payload.items,
        payload.params,
        payload.submitted_by,
    )?;
    let job = store.get_job(&job_id).ok_or_else(|| {
        OpsError::InternalError(format!("submitted batch job vanished: {job_id}"))
    })?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list_batch_jobs(
    State(admin): State<Arc<AdminSys>>,
    Query(filter): Query<JobFilter>,
) -> Json<JobListResponse> {
    debug!(?filter, "listing batch jobs");
    let store = admin.store();
    Json(JobListResponse {
        jobs: store.get_filtered_jobs(&filter),
        stats: store.get_stats(),
    })
}

pub async fn get_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, AdminApiError> {
    admin
        .store()
        .get_job(&job_id)
        .map(Json)
        .ok_or_else(|| AdminApiError(OpsError::JobNotFound(job_id)))
}

pub async fn cancel_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, AdminApiError> {
    Ok(Json(admin.store().cancel_job(&job_id)?))
}

pub async fn pause_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, AdminApiError> {
    Ok(Json(admin.store().pause_job(&job_id)?))
}

pub async fn resume_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, AdminApiError> {
    Ok(Json(admin.store().resume_job(&job_id)?))
}

pub async fn retry_batch_job(
    State(admin): State<Arc<AdminSys>>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, AdminApiError> {
    Ok(Json(admin.store().retry_job(&job_id)?))
}

pub async fn clear_completed_jobs(
    State(admin): State<Arc<AdminSys>>,
) -> Json<ClearCompletedResponse> {
    Json(ClearCompletedResponse {
        removed: admin.store().clear_completed(),
    })
}

pub async fn batch_stats(State(admin): State<Arc<AdminSys>>) -> Json<BatchStats> {
    Json(admin.store().get_stats())
}

pub async fn get_selection(State(admin): State<Arc<AdminSys>>) -> Json<SelectionResponse> {
    let store = admin.store();
    Json(SelectionResponse {
        job_id: store.selected_job_id(),
        job: store.selected_job(),
    })
}

pub async fn set_selection(
    State(admin): State<Arc<AdminSys>>,
    Json(payload): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, AdminApiError> {
    let store = admin.store();
    store.select_job(payload.job_id.as_deref())?;
    Ok(Json(SelectionResponse {
        job_id: store.selected_job_id(),
        job: store.selected_job(),
    }))
}
