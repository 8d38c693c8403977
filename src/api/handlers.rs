use crate::api::requests::{CorrectionBody, PredictBody};
use crate::api::responses::{
    CorrectionSuccessResponse, ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse,
    PredictSuccessResponse,
};
use crate::engine::QueueEngine;
use crate::estimation::BaselineSource;
use crate::estimation::model::WaitModel;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

/// Success body plus the shared error shape used by every endpoint.
pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: serde::Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub type PredictResponse = ApiResponse<PredictSuccessResponse>;
pub type CorrectionResponse = ApiResponse<CorrectionSuccessResponse>;

pub async fn post_predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictBody>, JsonRejection>,
) -> PredictResponse {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return build_rejection_response(&rejection, SystemTime::now()),
    };
    let engine = Arc::clone(state.engine());
    // The narrator call blocks on network I/O.
    match tokio::task::spawn_blocking(move || {
        build_predict_response(&engine, body, SystemTime::now())
    })
    .await
    {
        Ok(response) => response,
        Err(err) => internal_error(&format!("predict task failed: {err}"), "/api/predict"),
    }
}

pub async fn post_correction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CorrectionBody>, JsonRejection>,
) -> CorrectionResponse {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return build_rejection_response(&rejection, SystemTime::now()),
    };
    let engine = Arc::clone(state.engine());
    match tokio::task::spawn_blocking(move || {
        build_correction_response(&engine, body, SystemTime::now())
    })
    .await
    {
        Ok(response) => response,
        Err(err) => internal_error(&format!("correction task failed: {err}"), "/api/correction"),
    }
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_health_response(state.engine(), SystemTime::now())
}

/// Malformed or mistyped bodies get the same error shape as failed validation.
fn build_rejection_response<T>(rejection: &JsonRejection, now: SystemTime) -> ApiResponse<T> {
    invalid_request(&rejection.body_text(), now)
}

fn build_predict_response(
    engine: &QueueEngine,
    body: PredictBody,
    now: SystemTime,
) -> PredictResponse {
    let prediction = match body
        .into_request()
        .and_then(|request| engine.predict(&request))
    {
        Ok(prediction) => prediction,
        Err(err) => return invalid_request(&err, now),
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(PredictSuccessResponse {
            wait_time_minutes: prediction.wait.minutes(),
            reasoning: prediction.reasoning.text().to_string(),
            reasoning_status: prediction.reasoning.status(),
            baseline_source: prediction.baseline_source,
            timestamp,
        }),
        Err(_err) => internal_error("timestamp formatting failure", "/api/predict"),
    }
}

fn build_correction_response(
    engine: &QueueEngine,
    body: CorrectionBody,
    now: SystemTime,
) -> CorrectionResponse {
    let context = body.context();
    let correction = match engine.generate_correction(body.predicted, body.actual, context) {
        Ok(correction) => correction,
        Err(err) => return invalid_request(&err, now),
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(CorrectionSuccessResponse {
            gap_minutes: correction.gap_minutes,
            narrative: correction.narrative.text().to_string(),
            narrative_status: correction.narrative.status(),
            timestamp,
        }),
        Err(_err) => internal_error("timestamp formatting failure", "/api/correction"),
    }
}

fn build_health_response(
    engine: &QueueEngine,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let (baseline_source, model): (BaselineSource, &dyn WaitModel) =
        match engine.baseline().primary() {
            Some(model) => (BaselineSource::Artifact, model),
            None => (BaselineSource::Fallback, engine.baseline().fallback()),
        };
    let narrator = engine.narrator();

    let status = if baseline_source == BaselineSource::Artifact && narrator.is_available() {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(HealthSuccessResponse {
            status,
            baseline_source,
            model: model.describe().to_string(),
            model_version: model.version().map(str::to_string),
            narrator: narrator.name().to_string(),
            timestamp,
        }),
        Err(_err) => internal_error("timestamp formatting failure", "/api/health"),
    }
}

fn invalid_request<T>(err: &dyn fmt::Display, now: SystemTime) -> ApiResponse<T> {
    warn!(error = %err, "Rejected invalid request");
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error_code: ErrorCode::InvalidRequest,
                error_message: err.to_string(),
                timestamp,
            },
        },
        Err(_err) => internal_error("timestamp formatting failure", "request validation"),
    }
}

fn internal_error<T>(message: &str, route: &str) -> ApiResponse<T> {
    error!(message = message, route = route, "Internal error while handling request");
    let formatted = format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
