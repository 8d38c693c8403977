use crate::estimation::BaselineSource;
use crate::state::ReasoningStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PredictSuccessResponse {
    pub wait_time_minutes: f64,
    pub reasoning: String,
    pub reasoning_status: ReasoningStatus,
    pub baseline_source: BaselineSource,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CorrectionSuccessResponse {
    pub gap_minutes: f64,
    pub narrative: String,
    pub narrative_status: ReasoningStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub baseline_source: BaselineSource,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub narrator: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn predict_response_serializes_statuses_in_lowercase() {
        let response = PredictSuccessResponse {
            wait_time_minutes: 16.0,
            reasoning: "Queue is moving normally.".to_string(),
            reasoning_status: ReasoningStatus::Generated,
            baseline_source: BaselineSource::Fallback,
            timestamp: "2026-01-11T12:30:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize predict response");
        assert_eq!(
            value,
            json!({
                "wait_time_minutes": 16.0,
                "reasoning": "Queue is moving normally.",
                "reasoning_status": "generated",
                "baseline_source": "fallback",
                "timestamp": "2026-01-11T12:30:00Z"
            })
        );
    }

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ErrorCode::InvalidRequest,
            error_message: "hour out of range (0-23): 24".to_string(),
            timestamp: "2026-01-11T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "INVALID_REQUEST",
                "error_message": "hour out of range (0-23): 24",
                "timestamp": "2026-01-11T12:32:00Z"
            })
        );
    }

    #[test]
    fn health_response_omits_version_without_artifact() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Degraded,
            baseline_source: BaselineSource::Fallback,
            model: "fallback_formula".to_string(),
            model_version: None,
            narrator: "offline".to_string(),
            timestamp: "2026-01-11T12:33:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "degraded",
                "baseline_source": "fallback",
                "model": "fallback_formula",
                "narrator": "offline",
                "timestamp": "2026-01-11T12:33:00Z"
            })
        );
    }
}
