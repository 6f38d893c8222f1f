use std::io::Write;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::command::Command;
use crate::dispatcher::CommandHandler;

/// Handlers that can be wired to a command from the config file.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKind {
    /// Replies `Hello World`
    Hello,
    /// Replies with the command text
    Echo,
    /// Replies `Deploying!`
    Deploy,
    /// Always fails; handy for checking error plumbing
    Boom,
}

impl std::fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuiltinKind::Hello => write!(f, "hello"),
            BuiltinKind::Echo => write!(f, "echo"),
            BuiltinKind::Deploy => write!(f, "deploy"),
            BuiltinKind::Boom => write!(f, "boom"),
        }
    }
}

pub struct Builtin {
    kind: BuiltinKind,
    public: bool,
}

impl Builtin {
    pub fn new(kind: BuiltinKind, public: bool) -> Self {
        Self { kind, public }
    }
}

#[async_trait]
impl CommandHandler for Builtin {
    async fn handle(&self, cmd: &mut Command) -> Result<()> {
        match self.kind {
            BuiltinKind::Hello => cmd.write_all(b"Hello World")?,
            BuiltinKind::Echo => {
                let text = cmd.text.clone();
                cmd.write_all(text.as_bytes())?;
            }
            BuiltinKind::Deploy => cmd.write_all(b"Deploying!")?,
            BuiltinKind::Boom => anyhow::bail!("something exploded"),
        }

        if self.public {
            cmd.mark_public();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SlashForm;

    fn command(text: &str) -> Command {
        Command::from_form(SlashForm {
            command: "/test".to_string(),
            text: text.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_hello() {
        let mut cmd = command("");
        Builtin::new(BuiltinKind::Hello, false).handle(&mut cmd).await.unwrap();
        assert_eq!(cmd.snapshot(), b"Hello World");
        assert!(!cmd.is_public());
    }

    #[tokio::test]
    async fn test_echo_public() {
        let mut cmd = command("ship it");
        Builtin::new(BuiltinKind::Echo, true).handle(&mut cmd).await.unwrap();
        assert_eq!(cmd.snapshot(), b"ship it");
        assert!(cmd.is_public());
    }

    #[tokio::test]
    async fn test_boom_fails_and_stays_private() {
        let mut cmd = command("");
        let err = Builtin::new(BuiltinKind::Boom, true)
            .handle(&mut cmd)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "something exploded");
        assert!(!cmd.is_public());
    }

    #[test]
    fn test_kind_display_matches_config_name() {
        assert_eq!(BuiltinKind::Deploy.to_string(), "deploy");
        let kind: BuiltinKind = serde_json::from_str("\"echo\"").unwrap();
        assert_eq!(kind, BuiltinKind::Echo);
    }
}
