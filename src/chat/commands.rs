//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the session; anything else is sent to
//! the open thread as a chat message.

use crate::types::ThreadId;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Create an account (prompts for credentials).
    Signup,

    /// Sign in (prompts for credentials).
    Login,

    /// Sign out and forget the stored session.
    Logout,

    /// Show who is signed in.
    WhoAmI,

    /// List threads.
    Threads,

    /// Start a new thread.
    New,

    /// Open a thread and show its history.
    Open(ThreadId),

    /// Delete a thread.
    Delete(ThreadId),

    /// Refresh a thread's title.
    Title(ThreadId),

    /// Change the model.
    Model(String),

    /// List the models on offer.
    Models,

    /// Show recent exchanges across all threads.
    Recent,

    /// Check backend health.
    Health,

    /// Show or hide the thread sidebar.
    Sidebar,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// ```
/// use flowchat::chat::{ChatCommand, parse_command};
/// use flowchat::ThreadId;
///
/// assert_eq!(parse_command("/open 7"), Some(ChatCommand::Open(ThreadId(7))));
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "signup" | "register" => ChatCommand::Signup,
        "login" => ChatCommand::Login,
        "logout" => ChatCommand::Logout,
        "whoami" => ChatCommand::WhoAmI,
        "threads" | "ls" => ChatCommand::Threads,
        "new" => ChatCommand::New,
        "open" => parse_thread_command(argument, ChatCommand::Open, "/open"),
        "delete" | "rm" => parse_thread_command(argument, ChatCommand::Delete, "/delete"),
        "title" => parse_thread_command(argument, ChatCommand::Title, "/title"),
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "models" => ChatCommand::Models,
        "recent" | "history" => ChatCommand::Recent,
        "health" => ChatCommand::Health,
        "sidebar" => ChatCommand::Sidebar,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_thread_command<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: Fn(ThreadId) -> ChatCommand,
{
    match argument {
        Some(arg) => match arg.parse::<ThreadId>() {
            Ok(id) => constructor(id),
            Err(_) => ChatCommand::Invalid(format!("{} expects a thread id", name)),
        },
        None => ChatCommand::Invalid(format!("{} requires a thread id", name)),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /signup                Create an account
  /login                 Sign in
  /logout                Sign out and forget the stored session
  /whoami                Show who is signed in
  /threads               List your chats
  /new                   Start a new chat
  /open <id>             Open a chat and show its history
  /delete <id>           Delete a chat
  /title <id>            Refresh a chat's title
  /model <name>          Change the model (e.g., /model gpt-4.1-mini)
  /models                List available models
  /recent                Show recent exchanges across all chats
  /health                Check that the backend is reachable
  /sidebar               Show or hide the chat list
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_auth_commands() {
        assert_eq!(parse_command("/login"), Some(ChatCommand::Login));
        assert_eq!(parse_command("/SIGNUP"), Some(ChatCommand::Signup));
        assert_eq!(parse_command("/logout"), Some(ChatCommand::Logout));
        assert_eq!(parse_command("/whoami"), Some(ChatCommand::WhoAmI));
    }

    #[test]
    fn parse_thread_commands() {
        assert_eq!(parse_command("/threads"), Some(ChatCommand::Threads));
        assert_eq!(parse_command("/new"), Some(ChatCommand::New));
        assert_eq!(
            parse_command("/open 12"),
            Some(ChatCommand::Open(ThreadId(12)))
        );
        assert_eq!(
            parse_command("/delete  3 "),
            Some(ChatCommand::Delete(ThreadId(3)))
        );
        assert_eq!(
            parse_command("/title 5"),
            Some(ChatCommand::Title(ThreadId(5)))
        );
    }

    #[test]
    fn thread_commands_need_a_numeric_id() {
        assert_eq!(
            parse_command("/open"),
            Some(ChatCommand::Invalid("/open requires a thread id".to_string()))
        );
        assert!(matches!(
            parse_command("/delete abc"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model gpt-4o"),
            Some(ChatCommand::Model("gpt-4o".to_string()))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
        assert_eq!(parse_command("/models"), Some(ChatCommand::Models));
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse_command("/recent"), Some(ChatCommand::Recent));
        assert_eq!(parse_command("/health"), Some(ChatCommand::Health));
        assert_eq!(parse_command("/sidebar"), Some(ChatCommand::Sidebar));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid("Unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/login"));
        assert!(help.contains("/open <id>"));
        assert!(help.contains("/model"));
    }
}
