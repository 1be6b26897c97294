//! Status and body checks every adapter applies before reading its own format.

use serde::Deserialize;
use serde_json::Value;

use crate::{HttpReply, ProviderError, ProviderErrorKind, ProviderId};

/// A rejected reply plus whatever of the body could be captured.
pub(crate) struct RejectedReply {
    pub error: ProviderError,
    pub response_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

pub(crate) fn extract_error_message(body: &Value) -> Option<String> {
    let parsed = serde_json::from_value::<ErrorEnvelope>(body.clone()).ok()?;
    match parsed.error {
        ErrorBody::Detailed { message } | ErrorBody::Plain(message) => Some(message),
    }
}

/// Body as JSON when it parses, otherwise the raw text; `None` when blank.
pub(crate) fn capture_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }

    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

/// Applies the status table and the shape checks shared by all families:
/// the body must be non-empty JSON and must not embed an error object.
pub(crate) fn accept_reply(
    provider: ProviderId,
    reply: &HttpReply,
    status_overrides: &[(u16, ProviderErrorKind)],
) -> Result<Value, RejectedReply> {
    let captured = capture_body(&reply.body);

    if !reply.is_success() {
        let message = captured
            .as_ref()
            .and_then(extract_error_message)
            .unwrap_or_else(|| format!("{provider} request failed with status {}", reply.status));
        return Err(RejectedReply {
            error: ProviderError::from_status(reply.status, message, status_overrides),
            response_data: captured,
        });
    }

    let body = match captured {
        None => {
            return Err(RejectedReply {
                error: ProviderError::empty_body(format!("{provider} returned an empty body")),
                response_data: None,
            });
        }
        Some(Value::String(text)) => {
            return Err(RejectedReply {
                error: ProviderError::malformed_body(format!(
                    "{provider} returned a body that is not JSON"
                )),
                response_data: Some(Value::String(text)),
            });
        }
        Some(body) => body,
    };

    let is_empty = match &body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(RejectedReply {
            error: ProviderError::empty_body(format!("{provider} returned an empty body")),
            response_data: Some(body),
        });
    }

    if body.get("error").is_some_and(|error| !error.is_null()) {
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("{provider} returned an error object"));
        return Err(RejectedReply {
            error: ProviderError::embedded_error(message),
            response_data: Some(body),
        });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reject(reply: HttpReply) -> RejectedReply {
        match accept_reply(ProviderId::OpenAi, &reply, &[]) {
            Ok(body) => panic!("reply should be rejected, got {body}"),
            Err(rejected) => rejected,
        }
    }

    #[test]
    fn non_success_status_uses_body_message_when_present() {
        let rejected = reject(HttpReply::new(
            400,
            r#"{"error":{"message":"max_tokens is too large"}}"#,
        ));
        assert_eq!(rejected.error.kind, ProviderErrorKind::InvalidRequest);
        assert_eq!(rejected.error.message, "max_tokens is too large");
        assert!(rejected.response_data.is_some());
    }

    #[test]
    fn non_success_status_without_json_keeps_raw_text() {
        let rejected = reject(HttpReply::new(503, "upstream sad"));
        assert_eq!(rejected.error.kind, ProviderErrorKind::UnknownHttp(503));
        assert_eq!(rejected.error.message, "openai request failed with status 503");
        assert_eq!(rejected.response_data, Some(json!("upstream sad")));
    }

    #[test]
    fn success_status_shape_checks() {
        assert_eq!(reject(HttpReply::new(200, "")).error.kind, ProviderErrorKind::EmptyBody);
        assert_eq!(reject(HttpReply::new(200, "{}")).error.kind, ProviderErrorKind::EmptyBody);
        assert_eq!(
            reject(HttpReply::new(200, "<html>")).error.kind,
            ProviderErrorKind::MalformedBody
        );

        let embedded = reject(HttpReply::new(200, r#"{"error":"quota exhausted"}"#));
        assert_eq!(embedded.error.kind, ProviderErrorKind::EmbeddedError);
        assert_eq!(embedded.error.message, "quota exhausted");
    }

    #[test]
    fn well_formed_body_is_accepted() {
        let body = accept_reply(
            ProviderId::OpenAi,
            &HttpReply::new(200, r#"{"choices":[],"error":null}"#),
            &[],
        )
        .ok()
        .expect("body should pass shared checks");
        assert_eq!(body["choices"], json!([]));
    }
}
