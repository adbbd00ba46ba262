use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use uuid::Uuid;

use super::dto::ApiResponse;
use crate::domain::order::OrderError;

// ============================================================================
// HTTP Error Mapping
// ============================================================================
//
// NotFound → 404, InvalidState/validation → 400, Conflict → 409,
// infrastructure → 503. Infrastructure details are logged with a request id
// and never sent to the client.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{0}")]
    Validation(String),

    #[error("Metrics rendering failed: {0}")]
    Metrics(#[from] crate::metrics::MetricsError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Order(OrderError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Order(OrderError::InvalidState { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Order(OrderError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Order(OrderError::InfrastructureUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let body = if status.is_server_error() {
            let request_id = Uuid::now_v7();
            tracing::error!(request_id = %request_id, error = %self, "Request failed");
            let message = match self {
                ApiError::Metrics(_) => "Internal server error",
                _ => "Service temporarily unavailable",
            };
            ApiResponse::failure(message).with("requestId", request_id.to_string())
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
            ApiResponse::failure(self.to_string())
        };

        HttpResponse::build(status).json(body)
    }
}
