//! JSON response envelope.
//!
//! Every endpoint replies with `{"success": bool, "message": string, "data": ...}`
//! so the frontend can handle responses uniformly.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The standard JSON envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response without data.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// A failure envelope; the status code is supplied by the caller.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let resp = ApiResponse::ok("cart updated", serde_json::json!({"total_items": 3}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "cart updated");
        assert_eq!(json["data"]["total_items"], 3);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let resp = ApiResponse::error("cart is empty");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }
}
