use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a stored conversation, owned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<String> for HistoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HistoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Body of the send-message request: `{ "message": string }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Responder reply: `{ "response": string }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub response: String,
}

/// Result of a delete request: `{ "success": bool }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_requires_a_string_response_field() {
        assert!(serde_json::from_str::<Reply>(r#"{"response":"hi"}"#).is_ok());
        assert!(serde_json::from_str::<Reply>(r#"{"reply":"hi"}"#).is_err());
        assert!(serde_json::from_str::<Reply>(r#"{"response":null}"#).is_err());
        assert!(serde_json::from_str::<Reply>(r#"{"response":42}"#).is_err());
    }

    #[test]
    fn delete_outcome_requires_a_boolean() {
        let outcome: DeleteOutcome = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!outcome.success);
        assert!(serde_json::from_str::<DeleteOutcome>(r#"{"success":"yes"}"#).is_err());
    }

    #[test]
    fn history_id_serializes_as_a_bare_string() {
        let id = HistoryId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
        assert_eq!(id.to_string(), "42");
    }
}
