//! JSON envelopes for procedure responses

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{describe_error_code, MarketError, RpcErrorCode};
use crate::validation::FieldIssue;

/// `{"result":{"data": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub result: ResultData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    pub data: Value,
}

impl SuccessEnvelope {
    pub fn new(data: Value) -> Self {
        Self {
            result: ResultData { data },
        }
    }
}

/// `{"error":{"code": ..., "message": ..., "issues": [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: RpcErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

impl From<&MarketError> for ErrorEnvelope {
    fn from(err: &MarketError) -> Self {
        Self {
            error: ErrorBody {
                code: err.rpc_code(),
                message: err.user_message(),
                issues: err.issues().to_vec(),
            },
        }
    }
}

impl IntoResponse for SuccessEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.rpc_code().http_status();
        if status.is_server_error() {
            error!(
                error = %self,
                kind = describe_error_code(self.code()),
                "Request failed"
            );
        }
        (status, Json(ErrorEnvelope::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::storage::StorageError;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(SuccessEnvelope::new(json!({"id": 1}))).unwrap();
        assert_eq!(body, json!({"result": {"data": {"id": 1}}}));
    }

    #[test]
    fn test_error_shape_with_issues() {
        let err = MarketError::validation(
            "email: must be a valid email address",
            vec![FieldIssue {
                field: "email".to_string(),
                message: "must be a valid email address".to_string(),
            }],
        );
        let body = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["issues"][0]["field"], "email");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: MarketError = StorageError::connection("password=hunter2 refused").into();
        let body = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert!(!body["error"]["message"].as_str().unwrap().contains("hunter2"));
        assert!(body["error"].get("issues").is_none());
    }

    #[test]
    fn test_status_of_response() {
        let response =
            MarketError::rpc(ErrorCode::RPC_METHOD_NOT_SUPPORTED, "use POST").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::METHOD_NOT_ALLOWED);
    }
}
