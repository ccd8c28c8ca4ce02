//! The seam between the session logic and the HTTP API.
//!
//! [`SessionClient`](crate::SessionClient) speaks only to this trait. The
//! production implementation is [`FlowChat`](crate::FlowChat); tests substitute
//! scripted implementations.

use crate::error::Result;
use crate::types::{
    ChatRecord, ChatReply, ChatRequest, Credentials, CreatedThread, Health, RefreshedToken,
    Thread, ThreadId, ThreadTitle, TokenPair,
};

/// One async method per FlowChat API operation.
///
/// Methods that take `access` send it as a bearer token. A 401 from any of
/// those must be reported as [`Error::Unauthorized`](crate::Error::Unauthorized);
/// failures of the auth endpoints (`signup`, `obtain_token`, `refresh_token`)
/// are reported as [`Error::Authentication`](crate::Error::Authentication).
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Registers a new account.
    async fn signup(&self, credentials: &Credentials) -> Result<()>;

    /// Exchanges credentials for an access/refresh pair.
    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh_token(&self, refresh: &str) -> Result<RefreshedToken>;

    /// Lists the user's threads, newest first.
    async fn list_threads(&self, access: &str) -> Result<Vec<Thread>>;

    /// Creates an empty thread. The body may lack an identifier.
    async fn create_thread(&self, access: &str) -> Result<CreatedThread>;

    /// Deletes a thread. `Ok` means the server confirmed the deletion.
    async fn delete_thread(&self, access: &str, id: ThreadId) -> Result<()>;

    /// Fetches a thread's history, oldest first.
    async fn thread_messages(&self, access: &str, id: ThreadId) -> Result<Vec<ChatRecord>>;

    /// Fetches a thread's current title.
    async fn thread_title(&self, access: &str, id: ThreadId) -> Result<ThreadTitle>;

    /// Sends a prompt and waits for the model's answer.
    async fn chat(&self, access: &str, request: &ChatRequest) -> Result<ChatReply>;

    /// Lists every exchange the user owns across threads, newest first.
    async fn recent_records(&self, access: &str) -> Result<Vec<ChatRecord>>;

    /// Checks service health. Needs no credentials.
    async fn health(&self) -> Result<Health>;
}
