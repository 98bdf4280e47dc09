/**
 * Error Conversion
 *
 * `BackendError` implements `IntoResponse` so handlers can return it
 * directly. The body uses the same shape as successful chat responses:
 *
 * ```json
 * { "success": false, "message": "Error message" }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;
use crate::shared::ApiResponse;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body: ApiResponse<()> = ApiResponse::error(self.message());
        (status, Json(body)).into_response()
    }
}
