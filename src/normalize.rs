//! Failure message normalization.
//!
//! Failures reach the client in several shapes: a server response with a
//! JSON body, a bare payload object (a `success: false` envelope), or a plain
//! Rust error from the transport or decoder. [`normalize`] turns any of them
//! into the one string shown to the user.
//!
//! ## Precedence
//!
//! First match wins:
//!
//! | # | Shape | Source of the message |
//! |---|---|---|
//! | 1 | [`FailureShape::response`] | `message` field of the server response body |
//! | 2 | [`FailureShape::payload`] | `message` field of the payload object |
//! | 3 | [`FailureShape::error_message`] | `Display` of a generic error |
//! | 4 | none of the above | [`REQUEST_FAILED`] or [`UNEXPECTED_ERROR`] |
//!
//! The fallback is [`REQUEST_FAILED`] when a response or payload object was
//! present but carried no usable message, and [`UNEXPECTED_ERROR`] when the
//! failure had no recognizable shape at all.

use serde_json::Value;

/// Fallback when an object-shaped failure has no message.
pub const REQUEST_FAILED: &str = "Request failed";

/// Fallback when nothing about the failure is recognizable.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Every shape a failure may take, collected in one place.
///
/// More than one field may be set; [`normalize`] applies the precedence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureShape {
    /// Parsed body of a server response.
    pub response: Option<Value>,
    /// A bare payload object, typically an envelope with `success: false`.
    pub payload: Option<Value>,
    /// Message of a generic error.
    pub error_message: Option<String>,
}

impl FailureShape {
    pub fn from_response(body: Option<Value>) -> Self {
        Self {
            // A response with no parseable body is still an object-shaped failure.
            response: Some(body.unwrap_or(Value::Null)),
            ..Self::default()
        }
    }

    pub fn from_payload(payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self {
            error_message: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Reduce a failure to a single user-facing message.
pub fn normalize(shape: &FailureShape) -> String {
    if let Some(message) = shape.response.as_ref().and_then(message_field) {
        return message;
    }
    if let Some(message) = shape.payload.as_ref().and_then(message_field) {
        return message;
    }
    if let Some(message) = shape
        .error_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        return message.to_string();
    }
    if shape.response.is_some() || shape.payload.is_some() {
        REQUEST_FAILED.to_string()
    } else {
        UNEXPECTED_ERROR.to_string()
    }
}

/// Non-empty `message` string of a JSON object.
pub(crate) fn message_field(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_message_wins_over_everything() {
        let shape = FailureShape {
            response: Some(json!({"success": false, "message": "Email already taken"})),
            payload: Some(json!({"message": "payload"})),
            error_message: Some("io".into()),
        };
        assert_eq!(normalize(&shape), "Email already taken");
    }

    #[test]
    fn payload_message_used_when_response_has_none() {
        let shape = FailureShape {
            response: Some(json!({"success": false})),
            payload: Some(json!({"success": false, "message": "Limit reached"})),
            error_message: None,
        };
        assert_eq!(normalize(&shape), "Limit reached");
    }

    #[test]
    fn error_message_used_for_plain_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(normalize(&FailureShape::from_error(&err)), "connection refused");
    }

    #[test]
    fn blank_messages_are_skipped() {
        let shape = FailureShape {
            response: Some(json!({"message": "   "})),
            payload: None,
            error_message: Some("timed out".into()),
        };
        assert_eq!(normalize(&shape), "timed out");
    }

    #[test]
    fn non_string_message_is_ignored() {
        let shape = FailureShape::from_payload(json!({"message": 42}));
        assert_eq!(normalize(&shape), REQUEST_FAILED);
    }

    #[test]
    fn object_without_message_falls_back_to_request_failed() {
        assert_eq!(normalize(&FailureShape::from_response(None)), REQUEST_FAILED);
        assert_eq!(
            normalize(&FailureShape::from_response(Some(json!("<html>502</html>")))),
            REQUEST_FAILED
        );
    }

    #[test]
    fn empty_shape_falls_back_to_unexpected_error() {
        assert_eq!(normalize(&FailureShape::default()), UNEXPECTED_ERROR);
    }
}
