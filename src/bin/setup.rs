//! slashbot setup.
//!
//! Interactive terminal wizard that writes a starter `config.toml` to the
//! project root (`SLASHBOT_ROOT`, or the current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Config formatting ──────────────────────────────────────────────────────────

struct CommandParams<'a> {
    name: &'a str,
    token: &'a str,
    handler: &'a str,
    public: bool,
}

struct ConfigParams<'a> {
    bind: &'a str,
    webhook_url: &'a str,
    commands: &'a [CommandParams<'a>],
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let bind = p.bind;

    let webhook_line = if p.webhook_url.is_empty() {
        "url = \"\"  # set to enable public responses".to_owned()
    } else {
        format!("url = \"{}\"", p.webhook_url)
    };

    let mut out = format!(
        r#"[server]
bind = "{bind}"
path = "/"

[webhook]
{webhook_line}
timeout_secs = 10
"#
    );

    for c in p.commands {
        let name = c.name.trim_start_matches('/');
        out.push_str(&format!(
            "\n[[commands]]\nname = \"{name}\"\ntoken = \"{}\"\nhandler = \"{}\"\n",
            c.token, c.handler
        ));
        if c.public {
            out.push_str("public = true\n");
        }
    }

    out
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_owned())
}

fn or_default(s: String, default: &str) -> String {
    if s.is_empty() {
        default.to_owned()
    } else {
        s
    }
}

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== slashbot setup ===\n");

    let bind = or_default(read_line("Bind address [0.0.0.0:3000]: ")?, "0.0.0.0:3000");
    let webhook_url = read_line("Incoming webhook URL (optional): ")?;

    println!("\nAdd commands. Handlers: hello, echo, deploy, boom. Leave the name empty to finish.");
    let mut entries: Vec<(String, String, String, bool)> = Vec::new();
    loop {
        let name = read_line("Command name (e.g. /deploy): ")?;
        if name.is_empty() {
            break;
        }
        let token = read_line("  Verification token: ")?;
        let handler = or_default(read_line("  Handler [echo]: ")?, "echo");
        let public = matches!(
            read_line("  Post publicly via webhook? [y/N]: ")?.as_str(),
            "y" | "Y" | "yes"
        );
        entries.push((name, token, handler, public));
    }

    let commands: Vec<CommandParams<'_>> = entries
        .iter()
        .map(|(name, token, handler, public)| CommandParams {
            name,
            token,
            handler,
            public: *public,
        })
        .collect();

    let config = format_config(&ConfigParams {
        bind: &bind,
        webhook_url: &webhook_url,
        commands: &commands,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the server with:  cargo run");
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Resolve project root: prefer SLASHBOT_ROOT env, fall back to cwd.
    let project_root =
        PathBuf::from(std::env::var("SLASHBOT_ROOT").unwrap_or_else(|_| ".".to_string()));

    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(bind: &str, webhook_url: &str, commands: &[CommandParams<'_>]) -> String {
        format_config(&ConfigParams {
            bind,
            webhook_url,
            commands,
        })
    }

    #[test]
    fn test_server_section_present() {
        let out = cfg("127.0.0.1:4000", "", &[]);
        assert!(out.contains("[server]"));
        assert!(out.contains(r#"bind = "127.0.0.1:4000""#));
        assert!(out.contains(r#"path = "/""#));
    }

    #[test]
    fn test_webhook_url_included_when_set() {
        let out = cfg("0.0.0.0:3000", "https://hooks.example.com/x", &[]);
        assert!(out.contains("[webhook]"));
        assert!(out.contains(r#"url = "https://hooks.example.com/x""#));
    }

    #[test]
    fn test_webhook_url_empty_when_unset() {
        let out = cfg("0.0.0.0:3000", "", &[]);
        assert!(out.contains(r#"url = """#));
        assert!(out.contains("timeout_secs = 10"));
    }

    #[test]
    fn test_commands_listed_without_slash() {
        let commands = [
            CommandParams {
                name: "/hello",
                token: "foo",
                handler: "hello",
                public: false,
            },
            CommandParams {
                name: "deploy",
                token: "bar",
                handler: "deploy",
                public: true,
            },
        ];
        let out = cfg("0.0.0.0:3000", "", &commands);
        assert_eq!(out.matches("[[commands]]").count(), 2);
        assert!(out.contains(r#"name = "hello""#));
        assert!(out.contains(r#"token = "foo""#));
        assert!(out.contains(r#"handler = "deploy""#));
        assert_eq!(out.matches("public = true").count(), 1);
    }

    #[test]
    fn test_output_is_valid_toml() {
        let commands = [CommandParams {
            name: "echo",
            token: "t",
            handler: "echo",
            public: false,
        }];
        let out = cfg("0.0.0.0:3000", "", &commands);
        let value: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(value["commands"][0]["name"].as_str(), Some("echo"));
    }
}
