//! Converts raw HTTP exchanges into parsed payloads or classified errors.

use serde_json::Value;

use crate::error::{Error, ErrorKind};

/// Body of a successful API exchange.
#[derive(Debug)]
pub(crate) enum ApiBody {
    /// The endpoint answered with a JSON document.
    Json(Value),
    /// Anything else is carried through as raw bytes plus the declared type.
    Binary {
        content: Vec<u8>,
        content_type: String,
    },
}

impl ApiBody {
    pub(crate) fn into_json(self) -> Option<Value> {
        match self {
            ApiBody::Json(value) => Some(value),
            ApiBody::Binary { .. } => None,
        }
    }
}

/// Classifies a completed exchange: 2xx responses become an [`ApiBody`],
/// everything else becomes a typed [`Error`].
///
/// A body that declares `application/json` but fails to decode on a 2xx is
/// handed back as bytes rather than treated as an error.
pub(crate) fn interpret(
    status: u16,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> crate::Result<ApiBody> {
    if (200..300).contains(&status) {
        let content_type = content_type.unwrap_or("").to_string();
        if content_type.contains("application/json") {
            if let Ok(value) = serde_json::from_slice(&body) {
                return Ok(ApiBody::Json(value));
            }
        }
        return Ok(ApiBody::Binary {
            content: body,
            content_type,
        });
    }

    Err(classify_error(status, &body))
}

/// Builds the error for a non-2xx exchange from whatever the body contains.
pub(crate) fn classify_error(status: u16, body: &[u8]) -> Error {
    let (message, error_code, details) = match serde_json::from_slice::<Value>(body) {
        Ok(value) => error_parts(&value, status),
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                format!("HTTP Error {}", status)
            } else {
                text
            };
            (message, None, None)
        }
    };

    let kind = kind_for_status(status, &message);
    Error::new(kind, message)
        .with_status(status)
        .with_error_code(error_code)
        .with_details(details)
}

/// Extracts (message, code, details) from an error body, scanning the shapes
/// the API is known to produce, most specific first.
fn error_parts(value: &Value, status: u16) -> (String, Option<String>, Option<Value>) {
    if let Some(error) = value.get("error") {
        return match error {
            Value::Object(obj) => {
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP Error {}", status));
                let code = obj.get("code").and_then(Value::as_str).map(str::to_string);
                let details = obj.get("details").cloned();
                (message, code, details)
            }
            Value::String(s) => (s.clone(), None, None),
            other => (other.to_string(), None, None),
        };
    }

    if let Some(detail) = value.get("detail") {
        let message = match detail {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(detail_item)
                .collect::<Vec<_>>()
                .join("; "),
            Value::Object(_) => detail_item(detail),
            other => other.to_string(),
        };
        return (message, top_level_code(value), None);
    }

    for field in ["message", "description"] {
        if let Some(s) = value.get(field).and_then(Value::as_str) {
            return (s.to_string(), top_level_code(value), None);
        }
    }

    (value.to_string(), None, None)
}

fn detail_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("msg")
            .or_else(|| obj.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

fn top_level_code(value: &Value) -> Option<String> {
    value.get("code").and_then(Value::as_str).map(str::to_string)
}

/// Deterministic status-to-kind mapping. The message is consulted only for
/// the 403 insufficient-credit case.
pub(crate) fn kind_for_status(status: u16, message: &str) -> ErrorKind {
    match status {
        401 => ErrorKind::Auth,
        429 => ErrorKind::RateLimit,
        402 => ErrorKind::PaymentRequired,
        403 if message.to_lowercase().contains("insufficient credit") => {
            ErrorKind::PaymentRequired
        }
        400 | 422 => ErrorKind::Validation,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Server,
        _ => ErrorKind::Api,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_mapping_is_total_and_deterministic() {
        let cases = [
            (401, "", ErrorKind::Auth),
            (429, "", ErrorKind::RateLimit),
            (402, "", ErrorKind::PaymentRequired),
            (403, "Insufficient credits remaining", ErrorKind::PaymentRequired),
            (403, "Forbidden", ErrorKind::Api),
            (400, "", ErrorKind::Validation),
            (422, "", ErrorKind::Validation),
            (404, "", ErrorKind::NotFound),
            (500, "", ErrorKind::Server),
            (503, "", ErrorKind::Server),
            (599, "", ErrorKind::Server),
            (418, "", ErrorKind::Api),
        ];
        for (status, message, expected) in cases {
            assert_eq!(kind_for_status(status, message), expected, "status {}", status);
        }
    }

    #[test]
    fn error_object_supplies_message_code_and_details() {
        let body = json!({
            "error": {
                "message": "Invalid API key",
                "code": "auth_error",
                "details": { "hint": "Check your API key" }
            }
        });
        let err = classify_error(401, body.to_string().as_bytes());
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "Invalid API key");
        assert_eq!(err.error_code(), Some("auth_error"));
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(
            err.details().unwrap(),
            &json!({ "hint": "Check your API key" })
        );
        assert_eq!(
            err.to_string(),
            "Invalid API key (HTTP 401) [Error code: auth_error]"
        );
    }

    #[test]
    fn error_string_is_used_verbatim() {
        let err = classify_error(400, br#"{"error": "missing emails"}"#);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "missing emails");
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn detail_string_and_list_shapes_are_scanned() {
        let err = classify_error(422, br#"{"detail": "emails must not be empty"}"#);
        assert_eq!(err.message(), "emails must not be empty");

        let body = json!({
            "detail": [
                { "msg": "field required", "loc": ["emails"] },
                "value is not a valid list"
            ]
        });
        let err = classify_error(422, body.to_string().as_bytes());
        assert_eq!(
            err.message(),
            "field required; value is not a valid list"
        );
    }

    #[test]
    fn generic_message_and_description_fields_are_fallbacks() {
        let err = classify_error(500, br#"{"message": "boom", "code": "oops"}"#);
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.error_code(), Some("oops"));

        let err = classify_error(500, br#"{"description": "kaboom"}"#);
        assert_eq!(err.message(), "kaboom");
    }

    #[test]
    fn unrecognized_json_body_is_stringified() {
        let err = classify_error(500, br#"{"weird": true}"#);
        assert_eq!(err.message(), r#"{"weird":true}"#);
    }

    #[test]
    fn non_json_body_uses_its_text_or_a_default() {
        let err = classify_error(502, b"Bad Gateway");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.message(), "Bad Gateway");

        let err = classify_error(500, b"");
        assert_eq!(err.message(), "HTTP Error 500");
    }

    #[test]
    fn success_with_json_content_type_decodes() {
        let body = interpret(200, Some("application/json"), br#"[1, 2]"#.to_vec()).unwrap();
        assert_eq!(body.into_json(), Some(json!([1, 2])));
    }

    #[test]
    fn success_with_other_content_type_stays_binary() {
        let body = interpret(200, Some("text/csv"), b"email\na@b.example\n".to_vec()).unwrap();
        match body {
            ApiBody::Binary {
                content,
                content_type,
            } => {
                assert_eq!(content, b"email\na@b.example\n");
                assert_eq!(content_type, "text/csv");
            }
            ApiBody::Json(_) => panic!("expected binary body"),
        }
    }

    #[test]
    fn malformed_declared_json_degrades_to_binary() {
        let body = interpret(200, Some("application/json"), b"not json".to_vec()).unwrap();
        match body {
            ApiBody::Binary { content, .. } => assert_eq!(content, b"not json"),
            ApiBody::Json(_) => panic!("expected binary fallback"),
        }
    }

    #[test]
    fn payment_required_variants_map_consistently() {
        let err = classify_error(402, br#"{"error": {"message": "Insufficient credits"}}"#);
        assert_eq!(err.kind(), ErrorKind::PaymentRequired);
        assert!(err.to_string().contains("add credits"));

        let err =
            classify_error(403, br#"{"error": {"message": "Insufficient credit balance"}}"#);
        assert_eq!(err.kind(), ErrorKind::PaymentRequired);
    }
}
