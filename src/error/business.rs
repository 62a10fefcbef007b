//! Structured failures reported by the backend.
//!
//! The backend wraps every answer in an envelope of the form
//! `{"success": bool, "data": ..., "message": "...", "error": {...}}`.
//! A `success: false` envelope becomes a [`BusinessError`], whatever the
//! HTTP status was.

use std::fmt;

use serde_json::Value;

/// A failure envelope returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessError {
    /// HTTP status of the response that carried the envelope.
    pub status: u16,
    /// Machine-readable code from `error.code`.
    pub code: Option<String>,
    /// Error type from `error.type` (e.g. `ValidationError`).
    pub error_type: Option<String>,
    /// Human-readable message from `message`.
    pub message: String,
    /// Extra detail from `error.detail`.
    pub detail: Option<String>,
    /// Recovery guidance from `error.recovery_suggestion`.
    pub recovery_hint: Option<String>,
    /// The envelope's `data` field, kept for structured error payloads.
    pub data: Option<Value>,
}

impl BusinessError {
    /// Build a business error from a decoded failure envelope.
    pub fn from_envelope(status: u16, envelope: &Value) -> Self {
        let error = envelope.get("error");
        let field = |name: &str| -> Option<String> {
            error
                .and_then(|e| e.get(name))
                .and_then(value_to_string)
        };

        Self {
            status,
            code: field("code"),
            error_type: field("type"),
            message: envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string(),
            detail: field("detail"),
            recovery_hint: field("recovery_suggestion"),
            data: envelope.get("data").filter(|d| !d.is_null()).cloned(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        self.message.clone()
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        "E_BUSINESS"
    }
}

/// Codes arrive as strings or numbers depending on the endpoint.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (code {}, HTTP {})", self.message, code, self.status),
            None => write!(f, "{} (HTTP {})", self.message, self.status),
        }
    }
}

impl std::error::Error for BusinessError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_full_envelope() {
        let envelope = json!({
            "success": false,
            "message": "Header row changed",
            "error": {
                "code": "DATA_HEADER_CHANGED",
                "type": "ValidationError",
                "detail": "3 columns differ",
                "recovery_suggestion": "Re-map the template"
            },
            "data": {"error_code": "HEADER_CHANGED"}
        });

        let err = BusinessError::from_envelope(200, &envelope);
        assert_eq!(err.status, 200);
        assert_eq!(err.code.as_deref(), Some("DATA_HEADER_CHANGED"));
        assert_eq!(err.error_type.as_deref(), Some("ValidationError"));
        assert_eq!(err.detail.as_deref(), Some("3 columns differ"));
        assert_eq!(err.recovery_hint.as_deref(), Some("Re-map the template"));
        assert_eq!(err.data, Some(json!({"error_code": "HEADER_CHANGED"})));
        assert_eq!(err.user_message(), "Header row changed");
    }

    #[test]
    fn test_numeric_code_and_missing_message() {
        let envelope = json!({"success": false, "error": {"code": 4001}, "data": null});
        let err = BusinessError::from_envelope(422, &envelope);
        assert_eq!(err.code.as_deref(), Some("4001"));
        assert_eq!(err.message, "Request failed");
        assert!(err.data.is_none());
        assert_eq!(err.to_string(), "Request failed (code 4001, HTTP 422)");
    }
}
