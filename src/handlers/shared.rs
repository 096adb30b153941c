use serde::{Deserialize, Serialize};

/// Response envelope used by every endpoint. `kind` carries the stable
/// error kind on failure and is absent on success.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl<T> ApiResponse<T> {
    // Success with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            kind: None,
        }
    }

    // Success with message
    pub fn success_with_message(data: Option<T>, message: &str) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.to_string()),
            kind: None,
        }
    }

    // Error that still carries data (e.g. cap arithmetic)
    pub fn error_with_data(data: T, kind: &str, message: &str) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.to_string()),
            kind: Some(kind.to_string()),
        }
    }

    // Error response (no data)
    pub fn error(kind: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            kind: Some(kind.to_string()),
        }
    }
}
