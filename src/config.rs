use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::handlers::BuiltinKind;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_webhook_config")]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Route the platform POSTs slash commands to
    #[serde(default = "default_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Incoming webhook URL for public responses. Empty disables them.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default)]
    pub token: String,
    pub handler: BuiltinKind,
    /// Post the output to the webhook instead of replying to the caller
    #[serde(default)]
    pub public: bool,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
        path: default_path(),
    }
}

fn default_webhook_config() -> WebhookConfig {
    WebhookConfig {
        url: String::new(),
        timeout_secs: default_webhook_timeout_secs(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config")?;

        if !config.server.path.starts_with('/') {
            anyhow::bail!("server.path must start with '/': {:?}", config.server.path);
        }

        let mut seen = HashSet::new();
        for command in &mut config.commands {
            // Accept names written the way users type them ("/deploy").
            if let Some(stripped) = command.name.strip_prefix('/') {
                command.name = stripped.to_string();
            }
            if command.name.is_empty() {
                anyhow::bail!("Command with handler '{}' has an empty name", command.handler);
            }
            if command.token.is_empty() {
                warn!("Command '{}' has an empty token", command.name);
            }
            if !seen.insert(command.name.clone()) {
                warn!(
                    "Command '{}' is configured more than once; the last entry wins",
                    command.name
                );
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.server.path, "/");
        assert!(!config.webhook.is_configured());
        assert_eq!(config.webhook.timeout(), Duration::from_secs(10));
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[server]
bind = "127.0.0.1:8080"
path = "/slack/commands"

[webhook]
url = "https://hooks.example.com/services/T/B/X"
timeout_secs = 3

[[commands]]
name = "/hello"
token = "foo"
handler = "hello"

[[commands]]
name = "deploy"
token = "bar"
handler = "deploy"
public = true
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.path, "/slack/commands");
        assert!(config.webhook.is_configured());
        assert_eq!(config.webhook.timeout(), Duration::from_secs(3));
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[0].name, "hello");
        assert_eq!(config.commands[0].handler, BuiltinKind::Hello);
        assert!(!config.commands[0].public);
        assert!(config.commands[1].public);
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = Config::parse(
            r#"
[[commands]]
name = "/"
token = "foo"
handler = "echo"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_rejects_unknown_handler() {
        assert!(Config::parse(
            r#"
[[commands]]
name = "x"
handler = "launch"
"#,
        )
        .is_err());
    }

    #[test]
    fn test_rejects_relative_path() {
        assert!(Config::parse("[server]\npath = \"slack\"\n").is_err());
    }

    #[test]
    fn test_blank_webhook_url_is_unconfigured() {
        let config = Config::parse("[webhook]\nurl = \"  \"\n").unwrap();
        assert!(!config.webhook.is_configured());
    }
}
