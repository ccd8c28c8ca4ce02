use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The signed-in user.
    User,
    /// The model's reply.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation as displayed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn.
    pub role: Role,
    /// Raw message text; markup is interpreted only at render time.
    pub content: String,
    /// When the turn happened.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

impl Message {
    /// Creates a message.
    pub fn new(role: Role, content: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Creates a user message stamped with the current time.
    pub fn user_now(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, crate::utils::time::now())
    }
}

/// One server-side exchange: the user's prompt paired with the model's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Record identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Model that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The user's prompt.
    #[serde(default)]
    pub message: Option<String>,

    /// The model's response; absent while the exchange failed or is pending.
    #[serde(default)]
    pub response: Option<String>,

    /// When the exchange was recorded.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

impl ChatRecord {
    /// Expands the record into zero, one, or two display messages.
    ///
    /// The user side comes first. A side that is missing or empty produces no
    /// message; both sides share the record's timestamp.
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = self.message.filter(|m| !m.is_empty()) {
            messages.push(Message::new(Role::User, prompt, self.timestamp));
        }
        if let Some(response) = self.response.filter(|r| !r.is_empty()) {
            messages.push(Message::new(Role::Assistant, response, self.timestamp));
        }
        messages
    }
}

/// Flattens a history, in order, into display messages.
pub fn flatten_records(records: Vec<ChatRecord>) -> Vec<Message> {
    records
        .into_iter()
        .flat_map(ChatRecord::into_messages)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(value: serde_json::Value) -> ChatRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_record_expands_user_then_assistant() {
        let record = record(serde_json::json!({
            "message": "hi",
            "response": "hello",
            "timestamp": "2025-06-01T10:00:00Z"
        }));
        let t = datetime!(2025-06-01 10:00:00 UTC);
        assert_eq!(
            record.into_messages(),
            vec![
                Message::new(Role::User, "hi", t),
                Message::new(Role::Assistant, "hello", t),
            ]
        );
    }

    #[test]
    fn message_only_record_expands_to_user() {
        let record = record(serde_json::json!({
            "message": "anyone there?",
            "timestamp": "2025-06-01T10:00:00Z"
        }));
        let messages = record.into_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn empty_sides_are_skipped() {
        let record = record(serde_json::json!({
            "message": "",
            "response": null,
            "timestamp": "2025-06-01T10:00:00Z"
        }));
        assert!(record.into_messages().is_empty());
    }

    #[test]
    fn flatten_preserves_record_order() {
        let records = vec![
            record(serde_json::json!({"message": "a", "response": "b", "timestamp": "2025-06-01T10:00:00Z"})),
            record(serde_json::json!({"message": "c", "timestamp": "2025-06-01T10:01:00Z"})),
        ];
        let contents: Vec<_> = flatten_records(records)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
    }
}
