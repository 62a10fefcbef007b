//! Response classification.
//!
//! The backend answers with `{"success", "data", "message", "error"}`. Bodies
//! without that shape are passed through untouched.

use serde_json::Value;

use crate::error::{AuthError, BusinessError, SessionError, SystemError};
use crate::traits::Response;

/// Whether `value` has the envelope shape.
pub fn is_envelope(value: &Value) -> bool {
    value.get("success").map(Value::is_boolean).unwrap_or(false)
}

/// Decode a body as JSON. An empty body is `null`.
pub fn parse_body(response: &Response) -> Result<Value, serde_json::Error> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    response.json()
}

/// Classify a 2xx response.
///
/// `success: true` yields `data`, or the whole envelope when `data` is
/// absent or null. `success: false` is a [`BusinessError`].
pub fn decode_success(response: &Response) -> Result<Value, SessionError> {
    let value = parse_body(response).map_err(|e| SystemError::InvalidResponse {
        message: e.to_string(),
    })?;

    if !is_envelope(&value) {
        return Ok(value);
    }
    if value.get("success") == Some(&Value::Bool(false)) {
        return Err(BusinessError::from_envelope(response.status, &value).into());
    }
    match value.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Ok(value),
    }
}

/// Classify a non-2xx response that will not be retried.
pub fn decode_failure(response: &Response) -> SessionError {
    match parse_body(response) {
        Ok(value) if is_envelope(&value) => {
            BusinessError::from_envelope(response.status, &value).into()
        }
        _ => SystemError::http_status(response.status, body_excerpt(response)).into(),
    }
}

/// A 401 from an endpoint that is exempt from the refresh path.
pub fn rejected(response: &Response) -> AuthError {
    let value = parse_body(response).ok().filter(is_envelope);
    match value {
        Some(envelope) => {
            let business = BusinessError::from_envelope(response.status, &envelope);
            AuthError::Rejected {
                status: response.status,
                code: business.code,
                message: business.message,
                recovery_hint: business.recovery_hint,
            }
        }
        None => AuthError::Rejected {
            status: response.status,
            code: None,
            message: String::new(),
            recovery_hint: None,
        },
    }
}

fn body_excerpt(response: &Response) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, HttpErrorKind};
    use bytes::Bytes;
    use serde_json::json;

    #[test]
    fn test_success_unwraps_data() {
        let response = Response::json_body(200, &json!({"success": true, "data": {"id": 7}}));
        assert_eq!(decode_success(&response).unwrap(), json!({"id": 7}));
    }

    #[test]
    fn test_success_with_null_data_returns_envelope() {
        let envelope = json!({"success": true, "data": null, "message": "done"});
        let response = Response::json_body(200, &envelope);
        assert_eq!(decode_success(&response).unwrap(), envelope);
    }

    #[test]
    fn test_plain_body_passes_through() {
        let response = Response::json_body(200, &json!([1, 2, 3]));
        assert_eq!(decode_success(&response).unwrap(), json!([1, 2, 3]));

        let response = Response::json_body(200, &json!({"success": "yes"}));
        assert_eq!(decode_success(&response).unwrap(), json!({"success": "yes"}));
    }

    #[test]
    fn test_empty_body_is_null() {
        let response = Response::new(204, Bytes::new());
        assert_eq!(decode_success(&response).unwrap(), Value::Null);
    }

    #[test]
    fn test_invalid_body() {
        let response = Response::new(200, Bytes::from("<html>"));
        let err = decode_success(&response).unwrap_err();
        assert!(matches!(
            err,
            SessionError::System(SystemError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_success_false_is_business_error() {
        let response = Response::json_body(
            200,
            &json!({
                "success": false,
                "message": "Quota exceeded",
                "data": {"limit": 10},
                "error": {
                    "code": "QUOTA",
                    "type": "LimitError",
                    "detail": "10 of 10 used",
                    "recovery_suggestion": "Delete old items"
                }
            }),
        );
        match decode_success(&response).unwrap_err() {
            SessionError::Business(err) => {
                assert_eq!(err.status, 200);
                assert_eq!(err.code.as_deref(), Some("QUOTA"));
                assert_eq!(err.error_type.as_deref(), Some("LimitError"));
                assert_eq!(err.message, "Quota exceeded");
                assert_eq!(err.detail.as_deref(), Some("10 of 10 used"));
                assert_eq!(err.recovery_hint.as_deref(), Some("Delete old items"));
                assert_eq!(err.data, Some(json!({"limit": 10})));
            }
            other => panic!("expected business error, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_with_envelope_keeps_status() {
        let response =
            Response::json_body(422, &json!({"success": false, "message": "Bad name"}));
        match decode_failure(&response) {
            SessionError::Business(err) => {
                assert_eq!(err.status, 422);
                assert_eq!(err.message, "Bad name");
            }
            other => panic!("expected business error, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_without_envelope_is_system_error() {
        let err = decode_failure(&Response::new(502, Bytes::from("Bad Gateway")));
        assert_eq!(err.category(), ErrorCategory::Server);
        match err {
            SessionError::System(SystemError::HttpStatus { status, kind, message }) => {
                assert_eq!(status, 502);
                assert_eq!(kind, HttpErrorKind::Server);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected system error, got {:?}", other),
        }

        let err = decode_failure(&Response::new(404, Bytes::new()));
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_rejected_reads_envelope() {
        let response = Response::json_body(
            401,
            &json!({
                "success": false,
                "message": "Wrong password",
                "error": {"code": 4011, "recovery_suggestion": "Reset your password"}
            }),
        );
        let err = rejected(&response);
        assert_eq!(
            err,
            AuthError::Rejected {
                status: 401,
                code: Some("4011".to_string()),
                message: "Wrong password".to_string(),
                recovery_hint: Some("Reset your password".to_string()),
            }
        );
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_body_excerpt_is_bounded() {
        let long = "x".repeat(500);
        let err = decode_failure(&Response::new(500, Bytes::from(long)));
        match err {
            SessionError::System(SystemError::HttpStatus { message, .. }) => {
                assert_eq!(message.len(), 203);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
