use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chain::ChainError;
use crate::rpc::RpcError;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Empty(String),
    #[error("{0}")]
    Upstream(#[from] ChainError),
}

impl From<RpcError> for GatewayError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Upstream(e) => GatewayError::Upstream(e),
            other => GatewayError::Validation(other.to_string()),
        }
    }
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Empty(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let GatewayError::Upstream(e) = &self {
            tracing::warn!(error = %e, "upstream failure");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(
            GatewayError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Empty("none".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::from(ChainError::Timeout { millis: 5 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::from(RpcError::MethodNotSupported("foo".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::from(RpcError::Upstream(ChainError::Rpc("down".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
