//! Wire and domain types for the FlowChat API.

pub mod auth;
pub mod chat;
pub mod message;
pub mod model;
pub mod thread;

pub use auth::{Credentials, RefreshRequest, RefreshedToken, TokenPair};
pub use chat::{ChatReply, ChatRequest, Health};
pub use message::{ChatRecord, Message, Role, flatten_records};
pub use model::{KnownModel, Model};
pub use thread::{CreatedThread, Thread, ThreadId, ThreadTitle};
