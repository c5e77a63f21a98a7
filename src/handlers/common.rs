use crate::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Standard success response
pub fn success_response<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(data).with_message(message)),
    )
        .into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(data).with_message(message)),
    )
        .into_response()
}

/// Pagination parameters for list operations.
///
/// Kept as raw strings: an absent value takes the default, while a present
/// but malformed one (`page=`, `page=0`, `limit=-1`) is rejected.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number, starting at 1 (default: 1)
    pub page: Option<String>,
    /// Items per page (default: 10)
    pub limit: Option<String>,
}

impl PaginationParams {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn limit(&self) -> Option<&str> {
        self.limit.as_deref()
    }
}
