//! Wire contract of the assistant API.
//!
//! Request payloads are built here and response bodies decoded here, so the
//! rest of the crate never touches raw field names.

pub mod error;
pub mod types;

pub use error::MalformedResponse;
pub use types::{ChatReply, HistoryEntry};

use serde_json::{Value, json};

/// Payload for `POST /auth`.
#[must_use]
pub fn auth_payload(user_id: &str, password: &str) -> Value {
    json!({ "user_id": user_id, "password": password })
}

/// Payload for `POST /chat`.
#[must_use]
pub fn chat_payload(question: &str, user_id: &str, password: &str) -> Value {
    json!({ "question": question, "user_id": user_id, "password": password })
}

/// Payload for the credential-bearing `POST /history`.
#[must_use]
pub fn history_payload(user_id: &str, password: &str) -> Value {
    json!({ "user_id": user_id, "password": password })
}

/// Extract the assistant reply from a chat success body.
///
/// # Errors
/// Returns [`MalformedResponse`] when `response` is absent, not a string or
/// blank. Callers treat this as a soft failure.
pub fn decode_chat_reply(body: Value) -> Result<String, MalformedResponse> {
    let reply: ChatReply = serde_json::from_value(body)
        .map_err(|e| MalformedResponse::new("chat", e.to_string()))?;
    match reply.response {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(MalformedResponse::new("chat", "`response` is empty")),
        None => Err(MalformedResponse::new("chat", "missing `response`")),
    }
}

/// Decode a history success body into its ordered entries.
///
/// # Errors
/// Returns [`MalformedResponse`] when the body is not a list of
/// `{message, role}` objects.
pub fn decode_history(body: Value) -> Result<Vec<HistoryEntry>, MalformedResponse> {
    serde_json::from_value(body).map_err(|e| MalformedResponse::new("history", e.to_string()))
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `response` and `detail`, in that order; FastAPI-style
/// services put validation failures under `detail`.
#[must_use]
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "response", "detail"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names() {
        let chat = chat_payload("what is osmosis?", "alice", "pw");
        assert_eq!(chat["question"], "what is osmosis?");
        assert_eq!(chat["user_id"], "alice");
        assert_eq!(chat["password"], "pw");

        let auth = auth_payload("alice", "pw");
        assert_eq!(auth, history_payload("alice", "pw"));
    }

    #[test]
    fn test_decode_chat_reply() {
        assert_eq!(
            decode_chat_reply(json!({"response": "Osmosis is..."})).ok().as_deref(),
            Some("Osmosis is...")
        );
        assert!(decode_chat_reply(json!({"answer": "x"})).is_err());
        assert!(decode_chat_reply(json!({"response": "  "})).is_err());
        assert!(decode_chat_reply(json!({"response": 42})).is_err());
        assert!(decode_chat_reply(Value::Null).is_err());
    }

    #[test]
    fn test_decode_history_keeps_order() {
        let entries = decode_history(json!([
            {"message": "hi", "role": "user", "timestamp": "2024-05-01T10:00:00"},
            {"message": "hello!", "role": "assistant", "timestamp": null}
        ]))
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "hi");
        assert_eq!(entries[1].role, "assistant");
    }

    #[test]
    fn test_decode_history_rejects_objects() {
        let err = decode_history(json!({"message": "nope"})).unwrap_err();
        assert_eq!(err.endpoint, "history");
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"message":"Invalid password"}"#).as_deref(),
            Some("Invalid password")
        );
        assert_eq!(
            error_detail(r#"{"detail":"User not found"}"#).as_deref(),
            Some("User not found")
        );
        assert_eq!(error_detail("<html>oops</html>"), None);
        assert_eq!(error_detail(r#"{"message":""}"#), None);
    }
}
