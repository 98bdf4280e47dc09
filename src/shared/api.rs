//! REST Response Wrapper
//!
//! Every chat REST endpoint answers with the same JSON shape:
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": false, "message": "..." }
//! ```

use serde::{Deserialize, Serialize};

/// Uniform JSON body for REST responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failed response carrying a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_omits_message() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn test_error_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "message": "nope" }));
    }
}
