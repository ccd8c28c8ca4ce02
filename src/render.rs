//! Output rendering for the terminal chat.
//!
//! Two concerns live here: [`Notifier`], which the session uses to surface
//! transient user-facing messages, and [`PlainTextRenderer`], which draws
//! conversations and thread lists.

use std::io::{self, Stdout, Write};
use std::sync::Mutex;

use crate::config::NotificationStyle;
use crate::markup::{self, Node};
use crate::types::{Message, Role, Thread, ThreadId};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for code blocks and timestamps).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text.
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for inline code).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for warnings).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for success).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for blue text (used for info).
const ANSI_BLUE: &str = "\x1b[34m";

///////////////////////////////////////// Notifications /////////////////////////////////////////

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Something completed.
    Success,
    /// Neutral information.
    Info,
    /// Something needs attention but nothing failed.
    Warning,
    /// An operation failed.
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Creates an info notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives notifications raised by the session.
pub trait Notifier: Send + Sync {
    /// Presents a notification to the user.
    fn notify(&self, notification: Notification);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _: Notification) {}
}

/// Writes notifications to stderr in the configured style.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    style: NotificationStyle,
    use_color: bool,
}

impl TerminalNotifier {
    /// Creates a notifier.
    pub fn new(style: NotificationStyle, use_color: bool) -> Self {
        Self { style, use_color }
    }

    /// Formats a notification without printing it.
    pub fn format(&self, notification: &Notification) -> String {
        let (tag, color) = match notification.level {
            NotificationLevel::Success => ("ok", ANSI_GREEN),
            NotificationLevel::Info => ("info", ANSI_BLUE),
            NotificationLevel::Warning => ("warn", ANSI_YELLOW),
            NotificationLevel::Error => ("error", ANSI_RED),
        };
        let message = markup::strip_controls(&notification.message);
        match self.style {
            NotificationStyle::Toast => {
                if self.use_color {
                    format!("{color}[{tag}]{ANSI_RESET} {message}")
                } else {
                    format!("[{tag}] {message}")
                }
            }
            NotificationStyle::Alert => {
                let width = message.chars().count().max(tag.len()) + 2;
                let rule = "-".repeat(width);
                let body = format!(
                    "+{rule}+\n| {:<w$} |\n| {:<w$} |\n+{rule}+",
                    tag.to_uppercase(),
                    message,
                    w = width - 2
                );
                if self.use_color {
                    format!("{color}{body}{ANSI_RESET}")
                } else {
                    body
                }
            }
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", self.format(&notification));
    }
}

/// Keeps every notification; useful for tests and for UIs that drain them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *seen)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}

/////////////////////////////////////////// Messages ////////////////////////////////////////////

/// Trait for rendering conversation output.
pub trait Renderer: Send {
    /// Print one conversation turn.
    fn print_message(&mut self, message: &Message);

    /// Print the thread sidebar, marking the active thread.
    fn print_threads(&mut self, threads: &[Thread], active: Option<ThreadId>);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// Message bodies go through [`markup::parse`]; bold, italic and code spans
/// become ANSI styles, or are stripped to plain text when color is off.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Formats a message body without printing it.
    pub fn format_body(&self, content: &str) -> String {
        let nodes = markup::parse(content);
        if self.use_color {
            let mut out = String::new();
            write_ansi(&mut out, &nodes, &[]);
            out
        } else {
            markup::to_plain_text(&nodes)
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_ansi(out: &mut String, nodes: &[Node], styles: &[&str]) {
    for node in nodes {
        match node {
            Node::Text(text) => markup::push_printable(out, text),
            Node::Bold(children) => write_styled(out, children, styles, ANSI_BOLD),
            Node::Italic(children) => write_styled(out, children, styles, ANSI_ITALIC),
            Node::InlineCode(code) => {
                out.push_str(ANSI_CYAN);
                markup::push_printable(out, code);
                restore(out, styles);
            }
            Node::CodeBlock { language, code } => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(ANSI_DIM);
                if let Some(language) = language {
                    out.push('[');
                    markup::push_printable(out, language);
                    out.push_str("]\n");
                }
                for line in code.lines() {
                    out.push_str("    ");
                    markup::push_printable(out, line);
                    out.push('\n');
                }
                restore(out, styles);
            }
        }
    }
}

fn write_styled(out: &mut String, children: &[Node], styles: &[&str], style: &'static str) {
    out.push_str(style);
    let mut nested = styles.to_vec();
    nested.push(style);
    write_ansi(out, children, &nested);
    restore(out, styles);
}

/// Resets styling, then re-applies the styles of enclosing spans.
fn restore(out: &mut String, styles: &[&str]) {
    out.push_str(ANSI_RESET);
    for style in styles {
        out.push_str(style);
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        let who = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        let when = message
            .timestamp
            .format(&time::macros::format_description!("[hour]:[minute]"))
            .unwrap_or_default();
        if self.use_color {
            println!("{ANSI_BOLD}{who}{ANSI_RESET} {ANSI_DIM}{when}{ANSI_RESET}");
        } else {
            println!("{who} {when}");
        }
        let body = self.format_body(&message.content);
        println!("{}", body.trim_end_matches('\n'));
        println!();
        self.flush();
    }

    fn print_threads(&mut self, threads: &[Thread], active: Option<ThreadId>) {
        if threads.is_empty() {
            self.print_info("No chats yet. Use /new to start one.");
            return;
        }
        for thread in threads {
            let marker = if Some(thread.id) == active { '*' } else { ' ' };
            let label = markup::strip_controls(&thread.label());
            let line = format!("{marker} {:>5}  {label}", thread.id);
            if self.use_color && Some(thread.id) == active {
                println!("{ANSI_BOLD}{line}{ANSI_RESET}");
            } else {
                println!("{line}");
            }
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        let error = markup::strip_controls(error);
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{}", markup::strip_controls(info));
        self.flush();
    }
}
