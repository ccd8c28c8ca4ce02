//! Client library and terminal chat for the FlowChat API.
//!
//! [`FlowChat`] speaks HTTP to the backend. [`SessionClient`] sits on top of
//! any [`Backend`] and keeps the signed-in state: tokens, the thread list, and
//! the open conversation. [`markup`] renders message bodies safely.

// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod error;
pub mod markup;
pub mod observability;
pub mod render;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use backend::Backend;
pub use client::FlowChat;
pub use client_logger::{ClientLogger, StderrLogger};
pub use config::{ClientConfig, NotificationStyle, RefreshContract, SidebarMode};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{Notification, NotificationLevel, Notifier};
pub use session::{AuthMode, AuthState, ChatState, SessionClient};
pub use store::{FileTokenStore, MemoryTokenStore, StorageKey, TokenStore};
pub use types::*;
