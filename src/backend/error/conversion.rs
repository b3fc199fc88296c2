/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "success": false,
 *   "message": "Validation failed",
 *   "errors": [{ "field": "page", "message": "Page must be a positive integer" }]
 * }
 * ```
 *
 * `errors` is present only for validation failures. For 5xx responses an
 * `error` field with the internal detail is added when detail exposure is on.
 */

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Attach internal error details to 5xx responses (development only)
pub fn set_expose_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

pub fn expose_details() -> bool {
    EXPOSE_DETAILS.load(Ordering::Relaxed)
}

impl BackendError {
    /// Render the JSON error body
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "success": false,
            "message": self.message(),
        });

        let errors = self.field_errors();
        if !errors.is_empty() {
            body["errors"] = serde_json::json!(errors);
        }
        if self.is_internal() && expose_details() {
            body["error"] = serde_json::Value::String(self.to_string());
        }
        body
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!("Request failed with {}: {}", status, self);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, self);
        }
        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::error::types::StoreError;
    use axum::http::StatusCode;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_validation_body_lists_fields() {
        let body = BackendError::validation("limit", "Limit must be between 1 and 100").to_body();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "limit");
        assert!(body.get("error").is_none());
    }

    #[test]
    #[serial]
    fn test_internal_detail_only_when_exposed() {
        let err = BackendError::from(StoreError::Corrupt("row 7".to_string()));

        set_expose_details(false);
        assert!(err.to_body().get("error").is_none());

        set_expose_details(true);
        let body = err.to_body();
        assert!(body["error"].as_str().unwrap().contains("row 7"));
        assert_eq!(body["message"], "Internal server error");

        set_expose_details(false);
    }

    #[test]
    #[serial]
    fn test_into_response_status() {
        let response = BackendError::not_found("Notification not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
