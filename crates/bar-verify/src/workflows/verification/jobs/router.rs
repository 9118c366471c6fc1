use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::model::JobId;
use super::runner::{JobError, JobRunner, JobSubmission};
use super::store::JobStore;
use crate::error::AppError;
use crate::workflows::verification::domain::Jurisdiction;
use crate::workflows::verification::ingest::{self, ColumnMapping};
use crate::workflows::verification::normalizer::ApiCredential;

#[derive(Debug, Deserialize)]
pub struct SubmitVerificationRequest {
    pub state: String,
    #[serde(default)]
    pub api_key: String,
    pub csv: String,
    #[serde(default)]
    pub mapping: ColumnMapping,
}

/// Router exposing job submission, polling, and stop.
pub fn verification_router<S>(runner: Arc<JobRunner<S>>) -> Router
where
    S: JobStore + 'static,
{
    Router::new()
        .route("/api/v1/verifications", post(submit_handler::<S>))
        .route("/api/v1/verifications/:job_id", get(poll_handler::<S>))
        .route("/api/v1/verifications/:job_id/stop", post(stop_handler::<S>))
        .with_state(runner)
}

fn parse_job_id(raw: &str) -> Result<JobId, JobError> {
    raw.parse::<JobId>()
        .map_err(|_| JobError::UnknownId(raw.to_string()))
}

pub(crate) async fn submit_handler<S>(
    State(runner): State<Arc<JobRunner<S>>>,
    Json(request): Json<SubmitVerificationRequest>,
) -> Result<Response, AppError>
where
    S: JobStore + 'static,
{
    let jurisdiction = request.state.parse::<Jurisdiction>()?;
    if request.api_key.trim().is_empty() {
        return Err(AppError::MissingCredential);
    }
    let records = ingest::parse_records(Cursor::new(request.csv.into_bytes()), &request.mapping)?;

    let handle = runner.submit(JobSubmission {
        jurisdiction,
        records,
        credential: ApiCredential::new(request.api_key),
    })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": handle.id() })),
    )
        .into_response())
}

pub(crate) async fn poll_handler<S>(
    State(runner): State<Arc<JobRunner<S>>>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError>
where
    S: JobStore + 'static,
{
    let id = parse_job_id(&job_id)?;
    let view = runner.poll(&id)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn stop_handler<S>(
    State(runner): State<Arc<JobRunner<S>>>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError>
where
    S: JobStore + 'static,
{
    let id = parse_job_id(&job_id)?;
    let response = if runner.cancel(&id)? {
        (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Stop signal received" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "message": "Job already finished" })),
        )
    };
    Ok(response.into_response())
}
