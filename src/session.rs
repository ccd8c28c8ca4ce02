//! The chat session: credentials, threads and the open conversation.
//!
//! [`SessionClient`] turns UI events into API calls and folds the responses
//! back into one [`ChatState`]. Its methods take `&self`; the state sits
//! behind a mutex that is never held across an `.await`, so several operations
//! may be in flight at once and a renderer can read [`SessionClient::snapshot`]
//! while a request is outstanding.
//!
//! Failure handling follows one rule. A 401 from a resource endpoint triggers
//! exactly one token refresh and is returned as
//! [`Error::Unauthorized`](crate::Error::Unauthorized) so the caller can retry.
//! A failed refresh logs the user out. Any other request failure is reported
//! through the [`Notifier`] and returned. Validation failures are returned
//! without a notification and without touching state. Responses that arrive
//! after a logout are discarded.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::Backend;
use crate::client_logger::ClientLogger;
use crate::config::{ClientConfig, SidebarMode};
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_LOGINS, SESSION_LOGOUTS, SESSION_MESSAGES_SENT, SESSION_REFRESH_FAILURES,
    SESSION_STALE_RESPONSES, SESSION_TOKEN_REFRESHES,
};
use crate::render::{Notification, Notifier, SilentNotifier};
use crate::store::{StorageKey, TokenStore};
use crate::types::{
    ChatRequest, Credentials, Health, Message, Model, RefreshedToken, Role, Thread, ThreadId,
    TokenPair, flatten_records,
};
use crate::utils::time::now;

const NETWORK_HINT: &str = "Network error. Please ensure the backend is running and accessible.";

/// Where the session is in the sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No credentials.
    Unauthenticated,
    /// A login request is outstanding.
    Authenticating,
    /// Tokens are stored and resource calls may be made.
    Authenticated,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Which form the sign-in screen shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Exchange credentials for tokens.
    #[default]
    Login,
    /// Create an account.
    Signup,
}

/// Everything the UI renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    /// Sign-in lifecycle.
    pub auth: AuthState,
    /// Form shown while signed out.
    pub mode: AuthMode,
    /// Name of the signed-in user.
    pub username: Option<String>,
    /// The last-fetched thread list.
    pub threads: Vec<Thread>,
    /// Open thread; always `None` or an id in `threads`.
    pub active_thread: Option<ThreadId>,
    /// Conversation of the open thread.
    pub messages: Vec<Message>,
    /// An auth or chat request is outstanding.
    pub is_loading: bool,
    /// A history request is outstanding.
    pub is_loading_messages: bool,
    /// Whether the thread sidebar is shown.
    pub sidebar_open: bool,
    requests_in_flight: usize,
    history_in_flight: usize,
}

impl ChatState {
    /// The signed-out state.
    pub fn new() -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            mode: AuthMode::Login,
            username: None,
            threads: Vec::new(),
            active_thread: None,
            messages: Vec::new(),
            is_loading: false,
            is_loading_messages: false,
            sidebar_open: false,
            requests_in_flight: 0,
            history_in_flight: 0,
        }
    }

    /// Looks up a thread in the current list.
    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// True when the active thread is unset or present in the list.
    pub fn active_thread_is_listed(&self) -> bool {
        self.active_thread
            .is_none_or(|id| self.threads.iter().any(|t| t.id == id))
    }

    fn close_thread(&mut self) {
        self.active_thread = None;
        self.messages.clear();
    }

    /// Back to signed out. Requests still in flight keep their loading flags.
    fn reset(&mut self) {
        let requests = self.requests_in_flight;
        let history = self.history_in_flight;
        *self = ChatState::new();
        self.requests_in_flight = requests;
        self.history_in_flight = history;
        self.is_loading = requests > 0;
        self.is_loading_messages = history > 0;
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum LoadingFlag {
    Request,
    Messages,
}

/// Counts one outstanding request for its lifetime. The flag stays raised
/// until the last overlapping guard drops.
struct Loading<'a> {
    state: &'a Mutex<ChatState>,
    flag: LoadingFlag,
}

impl<'a> Loading<'a> {
    fn raise(state: &'a Mutex<ChatState>, flag: LoadingFlag) -> Self {
        count_request(state, flag, true);
        Self { state, flag }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        count_request(self.state, self.flag, false);
    }
}

fn count_request(state: &Mutex<ChatState>, flag: LoadingFlag, started: bool) {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    let state = &mut *guard;
    let (count, shown) = match flag {
        LoadingFlag::Request => (&mut state.requests_in_flight, &mut state.is_loading),
        LoadingFlag::Messages => (
            &mut state.history_in_flight,
            &mut state.is_loading_messages,
        ),
    };
    if started {
        *count += 1;
    } else {
        *count = count.saturating_sub(1);
    }
    *shown = *count > 0;
}

/// A signed-in (or signing-in) chat client.
pub struct SessionClient<B: Backend, S: TokenStore> {
    backend: B,
    store: S,
    config: ClientConfig,
    notifier: Arc<dyn Notifier>,
    logger: Option<Arc<dyn ClientLogger>>,
    state: Mutex<ChatState>,
    // Bumped by logout; responses captured under an older value are dropped.
    epoch: AtomicU64,
}

impl<B: Backend, S: TokenStore> SessionClient<B, S> {
    /// Creates a signed-out session. Call [`SessionClient::restore`] to pick up
    /// stored credentials.
    pub fn new(backend: B, store: S, config: ClientConfig) -> Self {
        Self {
            backend,
            store,
            config,
            notifier: Arc::new(SilentNotifier),
            logger: None,
            state: Mutex::new(ChatState::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Sets where notifications go.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Attaches a logger for state transitions.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The API backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration the session was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Locks the state unless a logout happened since `epoch` was read.
    fn lock_current(&self, epoch: u64) -> Option<MutexGuard<'_, ChatState>> {
        let state = self.lock();
        if self.epoch() == epoch {
            Some(state)
        } else {
            SESSION_STALE_RESPONSES.click();
            None
        }
    }

    /// A copy of the whole state.
    pub fn snapshot(&self) -> ChatState {
        self.lock().clone()
    }

    /// Sign-in lifecycle.
    pub fn auth_state(&self) -> AuthState {
        self.lock().auth
    }

    /// True once login (or restore) succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.auth_state() == AuthState::Authenticated
    }

    /// Form shown while signed out.
    pub fn auth_mode(&self) -> AuthMode {
        self.lock().mode
    }

    /// Switches between the login and signup forms.
    pub fn set_auth_mode(&self, mode: AuthMode) {
        self.lock().mode = mode;
    }

    /// Name of the signed-in user.
    pub fn username(&self) -> Option<String> {
        self.lock().username.clone()
    }

    /// The last-fetched thread list.
    pub fn threads(&self) -> Vec<Thread> {
        self.lock().threads.clone()
    }

    /// The open thread.
    pub fn active_thread(&self) -> Option<ThreadId> {
        self.lock().active_thread
    }

    /// Conversation of the open thread.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// True while an auth or chat request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    /// True while a history request is outstanding.
    pub fn is_loading_messages(&self) -> bool {
        self.lock().is_loading_messages
    }

    /// Whether the thread sidebar is shown.
    pub fn sidebar_open(&self) -> bool {
        self.lock().sidebar_open
    }

    /// Shows or hides the thread sidebar.
    pub fn set_sidebar_open(&self, open: bool) {
        self.lock().sidebar_open = open;
    }

    /// Flips the sidebar and returns the new visibility.
    pub fn toggle_sidebar(&self) -> bool {
        let mut state = self.lock();
        state.sidebar_open = !state.sidebar_open;
        state.sidebar_open
    }

    fn transition(&self, to: AuthState) {
        let from = {
            let mut state = self.lock();
            std::mem::replace(&mut state.auth, to)
        };
        if from != to
            && let Some(logger) = &self.logger
        {
            logger.log_transition(from, to);
        }
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(StorageKey::AccessToken)?
            .filter(|token| !token.is_empty()))
    }

    /// Best-effort mirror of the open thread into the store.
    fn persist_active(&self, id: Option<ThreadId>) {
        let outcome = match id {
            Some(id) => self.store.set(StorageKey::ActiveThread, &id.to_string()),
            None => self.store.remove(StorageKey::ActiveThread),
        };
        if let Err(err) = outcome
            && let Some(logger) = &self.logger
        {
            logger.log_failure("STORE", StorageKey::ActiveThread.as_str(), &err);
        }
    }

    fn close_sidebar_after_selection(&self, state: &mut ChatState) {
        if self.config.sidebar == SidebarMode::Overlay {
            state.sidebar_open = false;
        }
    }

    /// Routes a failed resource call: 401 refreshes, everything else notifies.
    async fn fail<T>(&self, context: &str, epoch: u64, err: Error) -> Result<T> {
        if err.is_unauthorized() {
            if self.epoch() == epoch {
                let _ = self.refresh_token().await;
            }
        } else if self.epoch() == epoch {
            self.notify(Notification::error(format!("{context}: {}", err.message())));
        }
        Err(err)
    }

    /// Signs up or logs in.
    ///
    /// Signup creates the account and switches to [`AuthMode::Login`] without
    /// establishing a session. Login stores the token pair and username, marks
    /// the session authenticated and refreshes the thread list.
    pub async fn authenticate(&self, username: &str, password: &str, mode: AuthMode) -> Result<()> {
        if username.trim().is_empty() {
            return Err(Error::validation(
                "username is required",
                Some("username".to_string()),
            ));
        }
        if password.is_empty() {
            return Err(Error::validation(
                "password is required",
                Some("password".to_string()),
            ));
        }
        let credentials = Credentials::new(username, password);
        let _loading = Loading::raise(&self.state, LoadingFlag::Request);

        match mode {
            AuthMode::Signup => match self.backend.signup(&credentials).await {
                Ok(()) => {
                    self.set_auth_mode(AuthMode::Login);
                    self.notify(Notification::success("Signup successful! Please log in."));
                    Ok(())
                }
                Err(err) => {
                    self.notify_auth_failure(&err);
                    Err(err)
                }
            },
            AuthMode::Login => {
                self.transition(AuthState::Authenticating);
                let pair = match self.backend.obtain_token(&credentials).await {
                    Ok(pair) => pair,
                    Err(err) => {
                        self.transition(AuthState::Unauthenticated);
                        self.notify_auth_failure(&err);
                        return Err(err);
                    }
                };
                if let Err(err) = self.persist_login(&pair, username) {
                    self.transition(AuthState::Unauthenticated);
                    self.notify(Notification::error(format!(
                        "Could not save session: {}",
                        err.message()
                    )));
                    return Err(err);
                }
                {
                    let mut state = self.lock();
                    state.username = Some(username.to_string());
                    state.threads.clear();
                    state.close_thread();
                }
                self.transition(AuthState::Authenticated);
                SESSION_LOGINS.click();
                self.notify(Notification::success("Login successful!"));
                let _ = self.list_threads().await;
                Ok(())
            }
        }
    }

    fn persist_login(&self, pair: &TokenPair, username: &str) -> Result<()> {
        self.store.set(StorageKey::AccessToken, &pair.access)?;
        self.store.set(StorageKey::RefreshToken, &pair.refresh)?;
        self.store.set(StorageKey::Username, username)?;
        self.store.remove(StorageKey::ActiveThread)
    }

    fn notify_auth_failure(&self, err: &Error) {
        let text = if err.is_network() {
            NETWORK_HINT.to_string()
        } else {
            format!("Authentication failed: {}", err.message())
        };
        self.notify(Notification::error(text));
    }

    /// Picks up credentials persisted by an earlier run.
    ///
    /// Returns whether the session ended up authenticated. The thread list is
    /// fetched, and the previously open thread is reopened if it still exists.
    pub async fn restore(&self) -> Result<bool> {
        if self.access_token()?.is_none() {
            return Ok(false);
        }
        let username = self.store.get(StorageKey::Username)?;
        self.lock().username = username;
        self.transition(AuthState::Authenticated);

        let _ = self.list_threads().await;
        if !self.is_authenticated() {
            return Ok(false);
        }

        let stored = self
            .store
            .get(StorageKey::ActiveThread)?
            .and_then(|id| id.parse::<ThreadId>().ok());
        if let Some(id) = stored {
            let listed = self.lock().thread(id).is_some();
            if listed {
                let _ = self.fetch_thread_messages(id).await;
            } else {
                self.persist_active(None);
            }
        }
        Ok(self.is_authenticated())
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Called automatically on a 401. On success the thread list is re-fetched;
    /// the failed call is not retried. On any failure the user is logged out,
    /// including a 401 on that re-fetch, and an error is returned.
    pub async fn refresh_token(&self) -> Result<()> {
        let epoch = self.epoch();
        let refresh = match self.store.get(StorageKey::RefreshToken) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                SESSION_REFRESH_FAILURES.click();
                self.logout();
                return Err(Error::unauthorized("no refresh token stored"));
            }
            Err(err) => {
                SESSION_REFRESH_FAILURES.click();
                self.logout();
                return Err(err);
            }
        };

        SESSION_TOKEN_REFRESHES.click();
        let token = match self.backend.refresh_token(&refresh).await {
            Ok(token) => token,
            Err(err) => {
                if self.epoch() == epoch {
                    SESSION_REFRESH_FAILURES.click();
                    self.logout();
                }
                return Err(err);
            }
        };
        if self.epoch() != epoch {
            SESSION_STALE_RESPONSES.click();
            return Err(Error::unauthorized("signed out during token refresh"));
        }
        if let Err(err) = self.persist_refreshed(&token) {
            SESSION_REFRESH_FAILURES.click();
            self.logout();
            return Err(err);
        }
        self.reload_threads_after_refresh(epoch, &token.access).await
    }

    fn persist_refreshed(&self, token: &RefreshedToken) -> Result<()> {
        self.store.set(StorageKey::AccessToken, &token.access)?;
        if self.config.refresh.persist_rotated
            && let Some(refresh) = &token.refresh
        {
            self.store.set(StorageKey::RefreshToken, refresh)?;
        }
        Ok(())
    }

    /// Thread refresh that never starts another token refresh.
    async fn reload_threads_after_refresh(&self, epoch: u64, access: &str) -> Result<()> {
        match self.backend.list_threads(access).await {
            Ok(threads) => {
                self.apply_threads(epoch, threads);
                Ok(())
            }
            Err(_) if self.epoch() != epoch => Ok(()),
            Err(err) if err.is_unauthorized() => {
                SESSION_REFRESH_FAILURES.click();
                self.logout();
                Err(Error::unauthorized(format!(
                    "refreshed token was rejected: {}",
                    err.message()
                )))
            }
            Err(err) => {
                self.notify(Notification::error(format!(
                    "Error fetching threads: {}",
                    err.message()
                )));
                Ok(())
            }
        }
    }

    /// Fetches the thread list. Without an access token this does nothing.
    pub async fn list_threads(&self) -> Result<()> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(());
        };
        match self.backend.list_threads(&access).await {
            Ok(threads) => {
                self.apply_threads(epoch, threads);
                Ok(())
            }
            Err(err) => self.fail("Error fetching threads", epoch, err).await,
        }
    }

    fn apply_threads(&self, epoch: u64, threads: Vec<Thread>) {
        let closed = {
            let Some(mut state) = self.lock_current(epoch) else {
                return;
            };
            state.threads = threads;
            if state.active_thread_is_listed() {
                false
            } else {
                state.close_thread();
                true
            }
        };
        if closed {
            self.persist_active(None);
        }
    }

    /// Creates a thread and opens it.
    ///
    /// The thread list is refreshed whatever the response looks like. Returns
    /// the new thread's id, or `None` when the server did not report one, in
    /// which case no thread is open afterwards.
    pub async fn create_thread(&self) -> Result<Option<ThreadId>> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(None);
        };
        let created = match self.backend.create_thread(&access).await {
            Ok(created) => created,
            Err(err) => return self.fail("Failed to create new chat", epoch, err).await,
        };

        let _ = self.list_threads().await;
        if !self.is_authenticated() {
            return Ok(None);
        }

        let thread = created.into_thread();
        let id = thread.as_ref().map(|t| t.id);
        {
            let Some(mut state) = self.lock_current(epoch) else {
                return Ok(None);
            };
            if let Some(thread) = thread
                && state.thread(thread.id).is_none()
            {
                state.threads.insert(0, thread);
            }
            state.active_thread = id;
            state.messages.clear();
            self.close_sidebar_after_selection(&mut state);
        }
        self.persist_active(id);
        Ok(id)
    }

    /// Deletes a thread, closing it first if it is open.
    pub async fn delete_thread(&self, id: ThreadId) -> Result<()> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(());
        };
        match self.backend.delete_thread(&access, id).await {
            Ok(()) => {
                let closed = {
                    let Some(mut state) = self.lock_current(epoch) else {
                        return Ok(());
                    };
                    state.threads.retain(|t| t.id != id);
                    if state.active_thread == Some(id) {
                        state.close_thread();
                        true
                    } else {
                        false
                    }
                };
                if closed {
                    self.persist_active(None);
                }
                Ok(())
            }
            Err(err) => self.fail("Error deleting thread", epoch, err).await,
        }
    }

    /// Opens a thread and loads its history.
    ///
    /// The thread becomes active and the message list is emptied before the
    /// request is sent. If another thread was opened by the time the history
    /// arrives, the history is dropped.
    ///
    /// A thread missing from the current list is rejected with
    /// [`Error::NotFound`] and leaves no thread open.
    pub async fn fetch_thread_messages(&self, id: ThreadId) -> Result<()> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(());
        };
        {
            let mut state = self.lock();
            if state.thread(id).is_none() {
                state.close_thread();
                drop(state);
                self.persist_active(None);
                return Err(Error::not_found(
                    "Thread not found",
                    Some("thread".to_string()),
                    Some(id.to_string()),
                ));
            }
            state.messages.clear();
            state.active_thread = Some(id);
            self.close_sidebar_after_selection(&mut state);
        }
        self.persist_active(Some(id));
        let _loading = Loading::raise(&self.state, LoadingFlag::Messages);

        match self.backend.thread_messages(&access, id).await {
            Ok(records) => {
                let messages = flatten_records(records);
                if let Some(mut state) = self.lock_current(epoch) {
                    if state.active_thread == Some(id) {
                        state.messages = messages;
                    } else {
                        SESSION_STALE_RESPONSES.click();
                    }
                }
                Ok(())
            }
            Err(err) => self.fail("Error fetching messages", epoch, err).await,
        }
    }

    /// Refreshes one thread's title in place.
    ///
    /// An empty title in the response leaves the cached one untouched.
    pub async fn fetch_thread_title(&self, id: ThreadId) -> Result<()> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(());
        };
        match self.backend.thread_title(&access, id).await {
            Ok(title) => {
                if let Some(title) = title.title.filter(|t| !t.is_empty())
                    && let Some(mut state) = self.lock_current(epoch)
                {
                    if let Some(thread) = state.threads.iter_mut().find(|t| t.id == id) {
                        thread.title = Some(title);
                    }
                }
                Ok(())
            }
            Err(err) => self.fail("Error fetching thread title", epoch, err).await,
        }
    }

    /// Sends a message to the open thread and returns the assistant's reply.
    ///
    /// The user's message is appended before the request goes out. When the
    /// thread has no title yet, its title is fetched after the reply arrives.
    pub async fn send_message(&self, text: &str, model: &Model) -> Result<Message> {
        if text.trim().is_empty() {
            return Err(Error::validation(
                "message is empty",
                Some("message".to_string()),
            ));
        }
        let epoch = self.epoch();
        let Some(thread_id) = self.active_thread() else {
            return Err(Error::validation(
                "no chat is open",
                Some("thread_id".to_string()),
            ));
        };
        let Some(access) = self.access_token()? else {
            return Err(Error::validation(
                "not signed in",
                Some("access_token".to_string()),
            ));
        };

        self.lock().messages.push(Message::user_now(text));
        let _loading = Loading::raise(&self.state, LoadingFlag::Request);
        SESSION_MESSAGES_SENT.click();

        let request = ChatRequest::new(model.clone(), text, thread_id);
        let reply = match self.backend.chat(&access, &request).await {
            Ok(reply) => reply,
            Err(err) => return self.fail("Error sending message", epoch, err).await,
        };

        let message = Message::new(
            Role::Assistant,
            reply.response,
            reply.timestamp.unwrap_or_else(now),
        );
        let needs_title = {
            let Some(mut state) = self.lock_current(epoch) else {
                return Ok(message);
            };
            if state.active_thread == Some(thread_id) {
                state.messages.push(message.clone());
            } else {
                SESSION_STALE_RESPONSES.click();
            }
            state.thread(thread_id).is_some_and(Thread::is_untitled)
        };
        if needs_title {
            let _ = self.fetch_thread_title(thread_id).await;
        }
        Ok(message)
    }

    /// Fetches every exchange the user owns, newest first, as display messages.
    ///
    /// Does not touch the open conversation.
    pub async fn recent_exchanges(&self) -> Result<Vec<Message>> {
        let epoch = self.epoch();
        let Some(access) = self.access_token()? else {
            return Ok(Vec::new());
        };
        match self.backend.recent_records(&access).await {
            Ok(records) => Ok(flatten_records(records)),
            Err(err) => self.fail("Error fetching history", epoch, err).await,
        }
    }

    /// Checks that the service is up.
    pub async fn check_health(&self) -> Result<Health> {
        match self.backend.health().await {
            Ok(health) => Ok(health),
            Err(err) => {
                let text = if err.is_network() {
                    NETWORK_HINT.to_string()
                } else {
                    format!("Health check failed: {}", err.message())
                };
                self.notify(Notification::error(text));
                Err(err)
            }
        }
    }

    /// Forgets the session: stored keys, threads, messages, everything.
    ///
    /// Safe to call at any time, any number of times.
    pub fn logout(&self) {
        SESSION_LOGOUTS.click();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.store.clear() {
            if let Some(logger) = &self.logger {
                logger.log_failure("STORE", "clear", &err);
            }
            for key in StorageKey::ALL {
                let _ = self.store.remove(key);
            }
        }
        let from = {
            let mut state = self.lock();
            let from = state.auth;
            state.reset();
            from
        };
        if from != AuthState::Unauthenticated
            && let Some(logger) = &self.logger
        {
            logger.log_transition(from, AuthState::Unauthenticated);
        }
        self.notify(Notification::info("You have been logged out."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_signed_out() {
        let state = ChatState::new();
        assert_eq!(state.auth, AuthState::Unauthenticated);
        assert_eq!(state.mode, AuthMode::Login);
        assert!(state.active_thread_is_listed());
        assert!(!state.is_loading && !state.is_loading_messages);
    }

    #[test]
    fn active_thread_must_be_listed() {
        let mut state = ChatState::new();
        state.threads = vec![Thread::new(ThreadId(1))];
        state.active_thread = Some(ThreadId(1));
        assert!(state.active_thread_is_listed());
        state.active_thread = Some(ThreadId(2));
        assert!(!state.active_thread_is_listed());
    }

    #[test]
    fn loading_guard_lowers_flag_on_drop() {
        let state = Mutex::new(ChatState::new());
        {
            let _loading = Loading::raise(&state, LoadingFlag::Messages);
            assert!(state.lock().unwrap().is_loading_messages);
        }
        assert!(!state.lock().unwrap().is_loading_messages);
    }

    #[test]
    fn overlapping_loading_guards_keep_flag_raised() {
        let state = Mutex::new(ChatState::new());
        let first = Loading::raise(&state, LoadingFlag::Request);
        let second = Loading::raise(&state, LoadingFlag::Request);
        drop(first);
        assert!(state.lock().unwrap().is_loading);
        drop(second);
        assert!(!state.lock().unwrap().is_loading);
        assert_eq!(state.lock().unwrap().requests_in_flight, 0);
    }

    #[test]
    fn reset_keeps_outstanding_requests_counted() {
        let state = Mutex::new(ChatState::new());
        let loading = Loading::raise(&state, LoadingFlag::Messages);
        state.lock().unwrap().reset();
        assert!(state.lock().unwrap().is_loading_messages);
        drop(loading);
        assert_eq!(*state.lock().unwrap(), ChatState::new());
    }

    #[test]
    fn auth_state_display() {
        assert_eq!(AuthState::Authenticating.to_string(), "authenticating");
    }
}
