use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::verification::domain::UnknownJurisdiction;
use crate::workflows::verification::{IngestError, JobError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Http(reqwest::Error),
    Ingest(IngestError),
    Jurisdiction(UnknownJurisdiction),
    Job(JobError),
    Output(csv::Error),
    MissingCredential,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Http(err) => write!(f, "http client error: {}", err),
            AppError::Ingest(err) => write!(f, "input error: {}", err),
            AppError::Jurisdiction(err) => write!(f, "input error: {}", err),
            AppError::Job(err) => write!(f, "job error: {}", err),
            AppError::Output(err) => write!(f, "could not write results: {}", err),
            AppError::MissingCredential => write!(f, "API key is missing"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Http(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::Jurisdiction(err) => Some(err),
            AppError::Job(err) => Some(err),
            AppError::Output(err) => Some(err),
            AppError::MissingCredential => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Ingest(_) | AppError::Jurisdiction(_) | AppError::MissingCredential => {
                StatusCode::BAD_REQUEST
            }
            AppError::Job(JobError::NotFound(_) | JobError::UnknownId(_)) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Http(_)
            | AppError::Job(_)
            | AppError::Output(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<UnknownJurisdiction> for AppError {
    fn from(value: UnknownJurisdiction) -> Self {
        Self::Jurisdiction(value)
    }
}

impl From<JobError> for AppError {
    fn from(value: JobError) -> Self {
        Self::Job(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Output(value)
    }
}
