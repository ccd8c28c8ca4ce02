//! Logging trait for FlowChat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every HTTP exchange made by the [`FlowChat`](crate::FlowChat) client and
//! every state transition of a [`SessionClient`](crate::SessionClient).

use std::time::Duration;

use crate::Error;
use crate::session::AuthState;

/// A trait for logging FlowChat client operations.
///
/// All methods have empty default bodies; implement the ones you care about.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use flowchat::ClientLogger;
///
/// struct Stderr;
///
/// impl ClientLogger for Stderr {
///     fn log_response(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
///         eprintln!("{method} {path} -> {status} in {elapsed:?}");
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Called before a request is sent.
    fn log_request(&self, method: &str, path: &str) {
        _ = method;
        _ = path;
    }

    /// Called when a response arrives, successful or not.
    fn log_response(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        _ = method;
        _ = path;
        _ = status;
        _ = elapsed;
    }

    /// Called when a request fails, including when no response was received.
    fn log_failure(&self, method: &str, path: &str, error: &Error) {
        _ = method;
        _ = path;
        _ = error;
    }

    /// Called when the session moves between authentication states.
    fn log_transition(&self, from: AuthState, to: AuthState) {
        _ = from;
        _ = to;
    }
}

/// A logger that writes one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl ClientLogger for StderrLogger {
    fn log_request(&self, method: &str, path: &str) {
        eprintln!("[flowchat] -> {method} {path}");
    }

    fn log_response(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        eprintln!(
            "[flowchat] <- {method} {path} {status} ({:.1} ms)",
            elapsed.as_secs_f64() * 1000.0
        );
    }

    fn log_failure(&self, method: &str, path: &str, error: &Error) {
        eprintln!("[flowchat] !! {method} {path}: {error}");
    }

    fn log_transition(&self, from: AuthState, to: AuthState) {
        eprintln!("[flowchat] session {from} -> {to}");
    }
}
