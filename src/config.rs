//! Client configuration.
//!
//! [`ClientConfig`] collects every knob that distinguished the historical UI
//! variants (notification strategy, sidebar behavior, refresh contract, model
//! list) together with the connection settings. It can be built in code with
//! the `with_*` methods or loaded from YAML.

use std::env;
use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utf8path::Path;

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model};

/// Base URL used when neither the caller nor the environment supplies one.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/";

/// Environment variable consulted for the base URL.
pub const API_BASE_ENV: &str = "FLOWCHAT_API_BASE";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REFRESH_PATH: &str = "token/refresh/";

/// How user-facing notifications are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStyle {
    /// Transient, colored one-liners.
    #[default]
    Toast,
    /// Blocking, framed alerts.
    Alert,
}

/// How the thread sidebar behaves when a thread is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarMode {
    /// Always visible; selection leaves it open.
    #[default]
    Docked,
    /// Overlays the conversation; selecting or creating a thread closes it.
    Overlay,
}

/// How access tokens are refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshContract {
    /// Path of the refresh endpoint, relative to the base URL.
    pub path: String,
    /// Persist a rotated refresh token when the server returns one.
    pub persist_rotated: bool,
}

impl Default for RefreshContract {
    fn default() -> Self {
        Self {
            path: DEFAULT_REFRESH_PATH.to_string(),
            persist_rotated: true,
        }
    }
}

/// Configuration for a FlowChat client and session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API; every endpoint path is joined onto it.
    pub base_url: Option<String>,

    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,

    /// Token refresh contract.
    pub refresh: RefreshContract,

    /// Notification presentation.
    pub notifications: NotificationStyle,

    /// Sidebar behavior.
    pub sidebar: SidebarMode,

    /// Models offered to the user.
    pub models: Vec<Model>,

    /// Model selected at startup.
    pub default_model: Model,

    /// Where the session store lives; `None` picks `$HOME/.flowchat/session.json`.
    pub store_path: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - Base URL: `FLOWCHAT_API_BASE`, then `http://localhost:8000/api/`
    /// - Timeout: 60 seconds
    /// - Refresh: `token/refresh/`, rotated tokens persisted
    /// - Notifications: toast
    /// - Sidebar: docked
    /// - Models: gemini-2.0-flash, gpt-4.1-mini, gpt-3.5-turbo
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh: RefreshContract::default(),
            notifications: NotificationStyle::default(),
            sidebar: SidebarMode::default(),
            models: vec![
                Model::Known(KnownModel::Gemini20Flash),
                Model::Known(KnownModel::Gpt41Mini),
                Model::Known(KnownModel::Gpt35Turbo),
            ],
            default_model: Model::Known(KnownModel::Gemini20Flash),
            store_path: None,
        }
    }

    /// Loads a configuration from a YAML file.
    ///
    /// Fields missing from the file keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path.as_str())
            .map_err(|err| Error::io(format!("failed to read config {}", path.as_str()), err))?;
        Self::from_yaml_str(&text)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the refresh contract.
    pub fn with_refresh(mut self, refresh: RefreshContract) -> Self {
        self.refresh = refresh;
        self
    }

    /// Sets the notification style.
    pub fn with_notifications(mut self, style: NotificationStyle) -> Self {
        self.notifications = style;
        self
    }

    /// Sets the sidebar mode.
    pub fn with_sidebar(mut self, mode: SidebarMode) -> Self {
        self.sidebar = mode;
        self
    }

    /// Replaces the model catalog.
    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    /// Sets the startup model.
    pub fn with_default_model(mut self, model: Model) -> Self {
        self.default_model = model;
        self
    }

    /// Sets the session store path.
    pub fn with_store_path(mut self, path: impl Into<String>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolves the base URL: explicit setting, then environment, then default.
    ///
    /// The result always ends in `/` so relative endpoint paths join beneath it.
    pub fn resolved_base_url(&self) -> String {
        let base = self
            .base_url
            .clone()
            .or_else(|| env::var(API_BASE_ENV).ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        normalize_base_url(base.trim())
    }

    /// Resolves the session store path.
    pub fn resolved_store_path(&self) -> Result<Path<'static>> {
        if let Some(path) = &self.store_path {
            return Ok(Path::from(path.as_str()).into_owned());
        }
        let home = env::var("HOME").map_err(|_| {
            Error::validation(
                "HOME is not set; pass a store path explicitly",
                Some("store_path".to_string()),
            )
        })?;
        Ok(Path::from(format!("{home}/.flowchat/session.json").as_str()).into_owned())
    }

    /// True when `model` is in the catalog.
    pub fn offers(&self, model: &Model) -> bool {
        self.models.contains(model)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_base_url(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.refresh.path, "token/refresh/");
        assert!(config.refresh.persist_rotated);
        assert_eq!(config.notifications, NotificationStyle::Toast);
        assert_eq!(config.sidebar, SidebarMode::Docked);
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.default_model, Model::Known(KnownModel::Gemini20Flash));
        assert!(config.offers(&Model::Known(KnownModel::Gpt35Turbo)));
        assert!(!config.offers(&Model::Known(KnownModel::Gpt4o)));
    }

    #[test]
    fn explicit_base_url_gets_trailing_slash() {
        let config = ClientConfig::new().with_base_url("https://chat.example.com/api");
        assert_eq!(config.resolved_base_url(), "https://chat.example.com/api/");
    }

    #[test]
    fn yaml_overrides_only_given_fields() {
        let config = ClientConfig::from_yaml_str(
            r#"
base_url: "https://chat.example.com/api/"
notifications: alert
sidebar: overlay
refresh:
  path: "token/"
  persist_rotated: false
models: ["gpt-4o", "my-local-model"]
"#,
        )
        .unwrap();
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://chat.example.com/api/")
        );
        assert_eq!(config.notifications, NotificationStyle::Alert);
        assert_eq!(config.sidebar, SidebarMode::Overlay);
        assert_eq!(config.refresh.path, "token/");
        assert!(!config.refresh.persist_rotated);
        assert_eq!(
            config.models,
            vec![
                Model::Known(KnownModel::Gpt4o),
                Model::Custom("my-local-model".to_string())
            ]
        );
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn builder_pattern() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_sidebar(SidebarMode::Overlay)
            .with_notifications(NotificationStyle::Alert)
            .with_default_model(Model::Known(KnownModel::Gpt41Mini))
            .with_store_path("/tmp/flowchat.json");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.sidebar, SidebarMode::Overlay);
        assert_eq!(config.notifications, NotificationStyle::Alert);
        assert_eq!(config.default_model, Model::Known(KnownModel::Gpt41Mini));
        assert_eq!(
            config.resolved_store_path().unwrap().as_str(),
            "/tmp/flowchat.json"
        );
    }
}
