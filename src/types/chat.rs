use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Model, ThreadId};

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model the backend should route the prompt to.
    pub model: Model,
    /// The user's prompt.
    pub message: String,
    /// Thread the exchange belongs to.
    pub thread_id: ThreadId,
}

impl ChatRequest {
    /// Creates a chat request.
    pub fn new(model: Model, message: impl Into<String>, thread_id: ThreadId) -> Self {
        Self {
            model,
            message: message.into(),
            thread_id,
        }
    }
}

/// Response of the chat endpoint.
///
/// Only `response` is required; the other fields are echoed by newer backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The model's answer.
    pub response: String,

    /// Identifier of the stored exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Model that answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Server timestamp of the exchange.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

impl ChatReply {
    /// Creates a reply carrying only the response text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            id: None,
            model: None,
            timestamp: None,
        }
    }
}

/// Response of the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// `"ok"` when the service is up.
    pub status: String,
}

impl Health {
    /// True when the service reported `ok`.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
