//! Procedure-layer error codes and their HTTP statuses

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Error code reported in the `error.code` field of a procedure response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Conflict,
    PreconditionFailed,
    InternalServerError,
}

impl RpcErrorCode {
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&RpcErrorCode::MethodNotSupported).unwrap();
        assert_eq!(json, "\"METHOD_NOT_SUPPORTED\"");
        let json = serde_json::to_string(&RpcErrorCode::PreconditionFailed).unwrap();
        assert_eq!(json, "\"PRECONDITION_FAILED\"");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(RpcErrorCode::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            RpcErrorCode::MethodNotSupported.http_status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
