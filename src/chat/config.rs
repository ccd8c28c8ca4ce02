//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and resolves the
//! arguments, an optional YAML file, and the environment into a [`ChatConfig`].

use arrrg_derive::CommandLine;
use utf8path::Path;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::types::Model;

/// Command-line arguments for the flowchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the API.
    #[arrrg(optional, "API base URL (default: $FLOWCHAT_API_BASE or http://localhost:8000/api/)", "URL")]
    pub base_url: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Where the session is persisted.
    #[arrrg(optional, "Session store (default: ~/.flowchat/session.json)", "FILE")]
    pub store: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.0-flash)", "MODEL")]
    pub model: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log every request and state change to stderr.
    #[arrrg(flag, "Log requests and session transitions to stderr")]
    pub verbose: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the configuration file.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Library configuration shared with the client and session.
    pub client: ClientConfig,

    /// The model used for new messages.
    pub model: Model,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log requests and transitions.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a ChatConfig from library defaults.
    pub fn new() -> Self {
        Self::from_client(ClientConfig::new())
    }

    fn from_client(client: ClientConfig) -> Self {
        Self {
            model: client.default_model.clone(),
            client,
            use_color: true,
            verbose: false,
        }
    }

    /// Resolves command-line arguments.
    ///
    /// The configuration file is read first; flags override what it sets.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let client = match &args.config {
            Some(path) => ClientConfig::from_yaml_file(&Path::from(path.as_str()))?,
            None => ClientConfig::new(),
        };
        Ok(Self::from_client(client).apply(args))
    }

    fn apply(mut self, args: ChatArgs) -> Self {
        if let Some(base_url) = args.base_url {
            self.client.base_url = Some(base_url);
        }
        if let Some(store) = args.store {
            self.client.store_path = Some(store);
        }
        if let Some(model) = args.model {
            self.model = Model::from(model);
        }
        self.use_color = !args.no_color;
        self.verbose = args.verbose;
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
