//! Response interpretation: backend reply → diagram text or error message.
//!
//! Kept apart from the transport so the field-priority rules can be tested
//! without a network and reused by any [`crate::pipeline::backend::DiagramBackend`].

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::pipeline::backend::BackendReply;
use serde_json::Value;

/// Turn a reply into the diagram text to commit, or the failure to surface.
///
/// * non-success status → [`TransportError::HttpStatus`] carrying the body's
///   `error` string, or the serialised body when that field is absent;
/// * success → [`extract_diagram`] with the configured field names.
pub fn interpret_reply(reply: &BackendReply, config: &ClientConfig) -> Result<String, TransportError> {
    if !reply.is_success() {
        return Err(TransportError::HttpStatus {
            status: reply.status,
            message: error_message(&reply.body),
        });
    }
    Ok(extract_diagram(
        &reply.body,
        &config.primary_field,
        &config.fallback_field,
    ))
}

/// Diagram text from the primary field, else the fallback field, else `""`.
///
/// A field counts as present only when it holds a non-empty string.
pub fn extract_diagram(body: &Value, primary: &str, fallback: &str) -> String {
    non_empty_str(body, primary)
        .or_else(|| non_empty_str(body, fallback))
        .unwrap_or_default()
        .to_string()
}

/// Human-readable message for a failed reply.
pub fn error_message(body: &Value) -> String {
    match non_empty_str(body, "error") {
        Some(msg) => msg.to_string(),
        None => body.to_string(),
    }
}

fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn primary_field_verbatim() {
        let body = json!({ "mermaid_code": "graph TD; A-->B;\n", "raw_mermaid": "ignored" });
        assert_eq!(
            extract_diagram(&body, "mermaid_code", "raw_mermaid"),
            "graph TD; A-->B;\n"
        );
    }

    #[test]
    fn fallback_when_primary_missing_or_empty() {
        let body = json!({ "raw_mermaid": "graph LR; X-->Y;" });
        assert_eq!(extract_diagram(&body, "mermaid_code", "raw_mermaid"), "graph LR; X-->Y;");

        let body = json!({ "mermaid_code": "", "raw_mermaid": "graph LR; X-->Y;" });
        assert_eq!(extract_diagram(&body, "mermaid_code", "raw_mermaid"), "graph LR; X-->Y;");
    }

    #[test]
    fn empty_when_both_missing() {
        assert_eq!(extract_diagram(&json!({ "summary": "hi" }), "mermaid_code", "raw_mermaid"), "");
        assert_eq!(extract_diagram(&json!([1, 2]), "mermaid_code", "raw_mermaid"), "");
        assert_eq!(extract_diagram(&json!({ "mermaid_code": 7 }), "mermaid_code", "raw_mermaid"), "");
    }

    #[test]
    fn error_field_preferred() {
        let reply = BackendReply::new(500, json!({ "error": "summarization failed" }));
        let err = interpret_reply(&reply, &cfg()).unwrap_err();
        assert_eq!(
            err,
            TransportError::HttpStatus {
                status: 500,
                message: "summarization failed".into()
            }
        );
    }

    #[test]
    fn whole_payload_when_no_error_field() {
        let reply = BackendReply::new(422, json!({ "detail": "bad" }));
        let err = interpret_reply(&reply, &cfg()).unwrap_err();
        assert_eq!(err.user_message(), r#"{"detail":"bad"}"#);
    }

    #[test]
    fn success_ignores_error_field() {
        let reply = BackendReply::new(200, json!({ "mermaid_code": "graph TD; A-->B;", "error": "x" }));
        assert_eq!(interpret_reply(&reply, &cfg()).unwrap(), "graph TD; A-->B;");
    }

    #[test]
    fn custom_field_names() {
        let config = ClientConfig::builder()
            .primary_field("diagram")
            .fallback_field("code")
            .build()
            .unwrap();
        let reply = BackendReply::new(200, json!({ "code": "graph TD; A;" }));
        assert_eq!(interpret_reply(&reply, &config).unwrap(), "graph TD; A;");
    }
}
