use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Server-assigned identifier of a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThreadId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ThreadId)
    }
}

impl From<u64> for ThreadId {
    fn from(id: u64) -> Self {
        ThreadId(id)
    }
}

/// A persisted conversation container.
///
/// The server creates threads without a title and fills one in after the
/// first exchange; until then `title` is empty or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// The thread identifier.
    pub id: ThreadId,

    /// The server-computed title.
    #[serde(default)]
    pub title: Option<String>,

    /// When the thread was created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Thread {
    /// Creates an untitled thread.
    pub fn new(id: ThreadId) -> Self {
        Self {
            id,
            title: None,
            created_at: None,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The title, or the empty string when the server has not assigned one.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// True until the server assigns a title.
    pub fn is_untitled(&self) -> bool {
        self.title().is_empty()
    }

    /// A label for lists: the title, or a placeholder naming the id.
    pub fn label(&self) -> String {
        if self.is_untitled() {
            format!("New chat #{}", self.id)
        } else {
            self.title().to_string()
        }
    }
}

/// Response of the thread-creation endpoint.
///
/// Every field is optional: the client must cope with a body that carries no
/// identifier at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedThread {
    /// Identifier of the new thread, if the server reported one.
    #[serde(default)]
    pub id: Option<ThreadId>,

    /// Title of the new thread, usually empty.
    #[serde(default)]
    pub title: Option<String>,
}

impl CreatedThread {
    /// Converts into a [`Thread`] when an identifier is present.
    pub fn into_thread(self) -> Option<Thread> {
        let id = self.id?;
        Some(Thread {
            id,
            title: self.title,
            created_at: None,
        })
    }
}

/// Response of the single-thread title endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadTitle {
    /// The thread, when echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ThreadId>,

    /// The current title; `None` or empty while the server is still naming it.
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_title_is_untitled() {
        let thread: Thread =
            serde_json::from_value(serde_json::json!({"id": 3, "title": null})).unwrap();
        assert_eq!(thread.id, ThreadId(3));
        assert!(thread.is_untitled());
        assert_eq!(thread.label(), "New chat #3");
        assert!(thread.created_at.is_none());
    }

    #[test]
    fn thread_list_with_created_at() {
        let threads: Vec<Thread> = serde_json::from_value(serde_json::json!([
            {"id": 9, "title": "Rust lifetimes", "created_at": "2025-06-01T10:20:30.123456Z"},
            {"id": 4, "title": ""}
        ]))
        .unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].title(), "Rust lifetimes");
        assert!(threads[0].created_at.is_some());
        assert!(threads[1].is_untitled());
    }

    #[test]
    fn created_thread_without_id() {
        let created: CreatedThread = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(created.into_thread().is_none());

        let created: CreatedThread =
            serde_json::from_value(serde_json::json!({"id": 12, "title": ""})).unwrap();
        assert_eq!(created.into_thread().map(|t| t.id), Some(ThreadId(12)));
    }

    #[test]
    fn thread_id_parses_trimmed() {
        assert_eq!(" 42 ".parse::<ThreadId>().unwrap(), ThreadId(42));
        assert!("abc".parse::<ThreadId>().is_err());
    }
}
