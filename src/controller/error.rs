use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum BaseError {
    ParamInvalid(Option<String>),
    NotFound(Option<String>),
    FormulaInvalid(Option<String>),
    StoreError(Option<String>),
    InternalServerError(Option<String>),
}

impl From<crate::service::app_state::AppStoreError> for BaseError {
    fn from(err: crate::service::app_state::AppStoreError) -> Self {
        use crate::service::app_state::AppStoreError;
        match err {
            AppStoreError::NotFound(msg) => BaseError::NotFound(Some(msg)),
            AppStoreError::AlreadyExists(msg) => BaseError::ParamInvalid(Some(msg)),
            AppStoreError::LockError(msg) => BaseError::StoreError(Some(msg)),
        }
    }
}

impl From<crate::service::formula::FormulaError> for BaseError {
    fn from(err: crate::service::formula::FormulaError) -> Self {
        BaseError::FormulaInvalid(Some(err.to_string()))
    }
}

impl IntoResponse for BaseError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message) = match self {
            BaseError::ParamInvalid(msg) => (
                StatusCode::BAD_REQUEST,
                1001,
                msg.unwrap_or("request params invalid".to_string()),
            ),
            BaseError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                1002,
                msg.unwrap_or("data not found".to_string()),
            ),
            BaseError::FormulaInvalid(msg) => (
                StatusCode::BAD_REQUEST,
                1300,
                msg.unwrap_or("formula invalid".to_string()),
            ),
            BaseError::StoreError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                1200,
                msg.unwrap_or("store operation failed".to_string()),
            ),
            BaseError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                0,
                msg.unwrap_or("internal server error".to_string()),
            ),
        };
        let body = Json(json!({
            "code": error_code,
            "msg": error_message,
        }));
        (status, body).into_response()
    }
}
