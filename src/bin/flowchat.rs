//! Interactive terminal client for FlowChat.
//!
//! This binary provides a REPL over a [`SessionClient`]: sign in, pick or
//! create a thread, and chat.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! flowchat
//!
//! # Point at another deployment
//! flowchat --base-url https://chat.example.com/api/
//!
//! # Load settings from YAML and log every request
//! flowchat --config flowchat.yaml --verbose
//!
//! # Disable colors (useful for piping output)
//! flowchat --no-color
//! ```
//!
//! # Commands
//!
//! - `/login`, `/signup`, `/logout` - Manage the session
//! - `/threads`, `/new`, `/open <id>`, `/delete <id>` - Manage chats
//! - `/model <name>` - Change the model
//! - `/help` - Show every command
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::error::ReadlineError;

use flowchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, LineEditor, PlainTextRenderer, Renderer, TerminalNotifier,
    help_text, line_editor, parse_command, read_secret,
};
use flowchat::{
    AuthMode, FileTokenStore, FlowChat, KnownModel, Model, SessionClient, SidebarMode,
    StderrLogger,
};

type Session = SessionClient<FlowChat, FileTokenStore>;

/// Main entry point for the flowchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("flowchat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;
    let use_color = config.use_color;

    let mut client = FlowChat::with_config(&config.client)?;
    let store = FileTokenStore::new(config.client.resolved_store_path()?);
    let notifier = Arc::new(TerminalNotifier::new(
        config.client.notifications,
        use_color,
    ));
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    println!("FlowChat ({})", client.base_url());

    let mut session =
        SessionClient::new(client, store, config.client.clone()).with_notifier(notifier);
    if config.verbose {
        session = session.with_logger(Arc::new(StderrLogger));
    }
    let sidebar = config.client.sidebar;
    session.set_sidebar_open(sidebar == SidebarMode::Docked);

    let mut model = config.model.clone();
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = line_editor()?;

    match session.restore().await {
        Ok(true) => {
            let who = session.username().unwrap_or_default();
            renderer.print_info(&format!("Signed in as {who} (model: {model})"));
            show_threads(&session, &mut renderer);
            show_conversation(&session, &mut renderer);
        }
        Ok(false) => renderer.print_info("Not signed in. Use /login or /signup."),
        Err(err) => renderer.print_error(&format!("Could not read session: {err}")),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let prompt = match session.active_thread() {
            Some(id) => format!("[{id}] You: "),
            None => "You: ".to_string(),
        };
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Signup => {
                            authenticate(&session, &mut rl, &mut renderer, AuthMode::Signup).await;
                        }
                        ChatCommand::Login => {
                            authenticate(&session, &mut rl, &mut renderer, AuthMode::Login).await;
                            if session.is_authenticated() {
                                show_threads(&session, &mut renderer);
                            }
                        }
                        ChatCommand::Logout => session.logout(),
                        ChatCommand::WhoAmI => match session.username() {
                            Some(name) if session.is_authenticated() => {
                                renderer.print_info(&format!("Signed in as {name}"))
                            }
                            _ => renderer.print_info("Not signed in."),
                        },
                        ChatCommand::Threads => {
                            if session.list_threads().await.is_ok() {
                                print_threads(&session, &mut renderer);
                            }
                        }
                        ChatCommand::New => match session.create_thread().await {
                            Ok(Some(id)) => renderer.print_info(&format!("Started chat {id}.")),
                            Ok(None) if session.is_authenticated() => renderer
                                .print_info("Chat created; pick it with /threads and /open <id>."),
                            Ok(None) => renderer.print_error("Sign in first."),
                            Err(_) => {}
                        },
                        ChatCommand::Open(id) => match session.fetch_thread_messages(id).await {
                            Ok(()) => show_conversation(&session, &mut renderer),
                            Err(err) if err.is_validation() || err.is_not_found() => {
                                renderer.print_error(&err.to_string())
                            }
                            Err(_) => {}
                        },
                        ChatCommand::Delete(id) => {
                            if session.delete_thread(id).await.is_ok() {
                                renderer.print_info(&format!("Deleted chat {id}."));
                            }
                        }
                        ChatCommand::Title(id) => {
                            if session.fetch_thread_title(id).await.is_ok() {
                                let title = session
                                    .threads()
                                    .into_iter()
                                    .find(|t| t.id == id)
                                    .map(|t| t.label());
                                match title {
                                    Some(title) => renderer.print_info(&title),
                                    None => renderer.print_error(&format!("No chat {id}.")),
                                }
                            }
                        }
                        ChatCommand::Model(name) => {
                            let choice = Model::from(name.as_str());
                            if !session.config().offers(&choice) {
                                renderer.print_info(&format!(
                                    "{choice} is not in the configured list; sending it anyway."
                                ));
                            }
                            model = choice;
                            renderer.print_info(&format!("Model changed to: {model}"));
                        }
                        ChatCommand::Models => {
                            for offered in &session.config().models {
                                let marker = if *offered == model { '*' } else { ' ' };
                                println!("{marker} {offered}");
                            }
                            let others: Vec<&str> = KnownModel::ALL
                                .iter()
                                .map(KnownModel::as_str)
                                .filter(|name| {
                                    !session.config().offers(&Model::from(*name))
                                })
                                .collect();
                            if !others.is_empty() {
                                println!("  also known: {}", others.join(", "));
                            }
                        }
                        ChatCommand::Recent => {
                            if let Ok(messages) = session.recent_exchanges().await {
                                if messages.is_empty() {
                                    renderer.print_info("No exchanges yet.");
                                }
                                for message in &messages {
                                    renderer.print_message(message);
                                }
                            }
                        }
                        ChatCommand::Health => {
                            if let Ok(health) = session.check_health().await {
                                renderer.print_info(&format!("Backend status: {}", health.status));
                            }
                        }
                        ChatCommand::Sidebar => {
                            if session.toggle_sidebar() {
                                print_threads(&session, &mut renderer);
                            } else {
                                renderer.print_info("Chat list hidden.");
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                if !session.is_authenticated() {
                    renderer.print_error("Sign in first with /login or /signup.");
                    continue;
                }
                if session.active_thread().is_none() && session.create_thread().await.is_err() {
                    continue;
                }
                match session.send_message(line, &model).await {
                    Ok(reply) => renderer.print_message(&reply),
                    Err(err) if err.is_validation() => renderer.print_error(&err.to_string()),
                    Err(_) => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn authenticate(
    session: &Session,
    rl: &mut LineEditor,
    renderer: &mut PlainTextRenderer,
    mode: AuthMode,
) {
    session.set_auth_mode(mode);
    let Ok(username) = rl.readline("Username: ") else {
        return;
    };
    let Ok(password) = read_secret(rl, "Password: ") else {
        return;
    };
    if let Err(err) = session
        .authenticate(username.trim(), &password, mode)
        .await
        && err.is_validation()
    {
        renderer.print_error(&err.to_string());
    }
}

/// Prints the thread list when the sidebar is visible.
fn show_threads(session: &Session, renderer: &mut PlainTextRenderer) {
    if session.sidebar_open() {
        print_threads(session, renderer);
    }
}

fn print_threads(session: &Session, renderer: &mut PlainTextRenderer) {
    let state = session.snapshot();
    renderer.print_threads(&state.threads, state.active_thread);
}

fn show_conversation(session: &Session, renderer: &mut PlainTextRenderer) {
    let state = session.snapshot();
    let Some(id) = state.active_thread else {
        return;
    };
    let label = state
        .thread(id)
        .map(|t| t.label())
        .unwrap_or_else(|| format!("Chat {id}"));
    renderer.print_info(&format!("== {label} =="));
    if state.messages.is_empty() {
        renderer.print_info("(no messages yet)");
    }
    for message in &state.messages {
        renderer.print_message(message);
    }
}
