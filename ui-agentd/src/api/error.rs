use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crate::catalog::RpcError;
use crate::metrics_proxy::ProxyError;

/// Errors surfaced to dashboard callers. The body only ever carries the
/// short reason; details stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Feature disabled or unconfigured
    #[error("{0}")]
    NotFound(String),
    /// Malformed request or a target outside the allowed prefix
    #[error("{0}")]
    BadRequest(String),
    /// The catalog or metrics backend failed
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("API error: {}", self);
        } else {
            tracing::debug!("API client error: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<RpcError> for ApiError {
    fn from(err: RpcError) -> Self {
        // The RPC error can name the catalog's internal address
        tracing::error!("Catalog query failed: {}", err);
        ApiError::Upstream("Error querying catalog".to_string())
    }
}
