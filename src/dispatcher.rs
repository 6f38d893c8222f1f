use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::command::{Command, SlashForm};
use crate::error::DispatchError;
use crate::webhook::{PublicMessage, WebhookClient};

/// Logic producing the response for one slash command.
///
/// Output goes into `cmd` via [`std::io::Write`]. Everything must be
/// written before `handle` returns; the dispatcher reads the buffer right
/// after.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, cmd: &mut Command) -> Result<()>;
}

/// Adapts a plain closure into a [`CommandHandler`].
pub struct HandlerFn<F>(pub F);

#[async_trait]
impl<F> CommandHandler for HandlerFn<F>
where
    F: Fn(&mut Command) -> Result<()> + Send + Sync,
{
    async fn handle(&self, cmd: &mut Command) -> Result<()> {
        (self.0)(cmd)
    }
}

/// How a successfully handled command reaches its audience.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Output goes back to the caller as the HTTP response body.
    Private(Vec<u8>),
    /// Output was posted to the webhook; the caller gets an empty 200.
    Public,
}

impl IntoResponse for Delivery {
    fn into_response(self) -> Response {
        match self {
            Delivery::Private(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body,
            )
                .into_response(),
            Delivery::Public => StatusCode::OK.into_response(),
        }
    }
}

/// Handlers and tokens keyed by command name. Both maps always hold the
/// same set of keys.
#[derive(Default)]
struct Registry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    tokens: HashMap<String, String>,
}

/// Routes slash commands to their handlers and enforces per-command tokens.
pub struct Dispatcher {
    registry: Mutex<Registry>,
    webhook: Option<WebhookClient>,
}

impl Dispatcher {
    /// Without a webhook, commands marked public fail with
    /// [`DispatchError::WebhookNotConfigured`].
    pub fn new(webhook: Option<WebhookClient>) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            webhook,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Every critical section is a plain map insert or lookup, so a
        // poisoned lock still guards consistent maps.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for command `name` with `token`, replacing any
    /// previous registration of `name`.
    pub fn register<H>(&self, name: impl Into<String>, token: impl Into<String>, handler: H)
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        let mut registry = self.registry();
        if registry.handlers.contains_key(&name) {
            warn!(command = %name, "Replacing existing registration");
        }
        registry.handlers.insert(name.clone(), Arc::new(handler));
        registry.tokens.insert(name, token.into());
    }

    /// Register a closure as the handler for `name`.
    #[allow(dead_code)]
    pub fn handle_fn<F>(&self, name: impl Into<String>, token: impl Into<String>, handler: F)
    where
        F: Fn(&mut Command) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, token, HandlerFn(handler));
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry().handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// True only when `command` is registered and `token` equals its token
    /// exactly. Unknown commands and wrong tokens are indistinguishable here.
    pub fn valid_token(&self, command: &str, token: &str) -> bool {
        let registry = self.registry();
        match registry.tokens.get(command) {
            Some(expected) => {
                let expected = expected.as_bytes();
                let provided = token.as_bytes();
                expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
            }
            None => false,
        }
    }

    fn lookup(&self, command: &str) -> Option<Arc<dyn CommandHandler>> {
        self.registry().handlers.get(command).cloned()
    }

    /// Handle one form-encoded slash-command request body.
    #[allow(dead_code)]
    pub async fn handle_request(&self, body: &[u8]) -> Result<Delivery, DispatchError> {
        self.handle_request_with_query(None, body).await
    }

    /// Handle a request whose fields may also arrive in the URL query
    /// string. Body values take precedence.
    ///
    /// Checks run in a fixed order: form parse, command present, command
    /// registered, token valid. An unknown command is reported as such
    /// whatever token came with it.
    pub async fn handle_request_with_query(
        &self,
        query: Option<&str>,
        body: &[u8],
    ) -> Result<Delivery, DispatchError> {
        let form = SlashForm::parse(query, body).inspect_err(|e| {
            error!(error = ?e, "Failed to parse slash command form");
        })?;
        let mut cmd = Command::from_form(form).inspect_err(|_| {
            warn!("Request without a command");
        })?;

        let Some(handler) = self.lookup(&cmd.name) else {
            error!(
                command = %cmd.name,
                user = %cmd.user_name,
                channel = %cmd.channel_name,
                "Invalid command"
            );
            return Err(DispatchError::UnknownCommand(cmd.name));
        };

        if !self.valid_token(&cmd.name, &cmd.token) {
            error!(
                command = %cmd.name,
                token = %cmd.token,
                user = %cmd.user_name,
                channel = %cmd.channel_name,
                "Invalid token"
            );
            return Err(DispatchError::Unauthorized {
                command: cmd.name,
                token: cmd.token,
            });
        }

        info!(
            command = %cmd.name,
            text = %cmd.text,
            user = %cmd.user_name,
            channel = %cmd.channel_name,
            "Received command"
        );

        if let Err(e) = handler.handle(&mut cmd).await {
            error!(command = %cmd.name, user = %cmd.user_name, "Handler failed: {:#}", e);
            return Err(DispatchError::HandlerFailure(e.to_string()));
        }

        if !cmd.is_public() {
            return Ok(Delivery::Private(cmd.into_output()));
        }

        self.deliver_publicly(&cmd).await.inspect_err(|e| {
            error!(
                command = %cmd.name,
                user = %cmd.user_name,
                channel = %cmd.channel_name,
                "Public delivery failed: {}",
                e
            );
        })?;

        Ok(Delivery::Public)
    }

    async fn deliver_publicly(&self, cmd: &Command) -> Result<(), DispatchError> {
        let webhook = self
            .webhook
            .as_ref()
            .ok_or(DispatchError::WebhookNotConfigured)?;

        let message = PublicMessage::new(cmd.output_text(), &cmd.channel_name);
        webhook.post(&message).await?;

        info!(command = %cmd.name, channel = %message.channel, "Posted public response");
        Ok(())
    }
}
