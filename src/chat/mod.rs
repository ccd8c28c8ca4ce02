//! Terminal front end for a FlowChat session.
//!
//! The `flowchat` binary is a thin loop over the pieces here:
//!
//! - [`config`]: CLI argument parsing and resolution into a [`ChatConfig`]
//! - [`commands`]: slash command parsing
//! - [`input`]: the line editor and masked password entry
//!
//! Rendering lives in [`crate::render`] and all session logic in
//! [`crate::session`].

mod commands;
mod config;
mod input;

pub use crate::render::{PlainTextRenderer, Renderer, TerminalNotifier};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use input::{LineEditor, PasswordMask, line_editor, read_secret};
