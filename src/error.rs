//! Error types for slash-command dispatch.
//!
//! Every variant is terminal for its request. The `Display` text is the
//! plain-text body returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors produced while handling one slash-command request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request body is not a valid form.
    #[error("Invalid request body")]
    MalformedRequest(String),

    /// The `command` field is empty or absent.
    #[error("command required")]
    MissingCommand,

    /// No handler is registered for the command.
    #[error("Invalid command")]
    UnknownCommand(String),

    /// The supplied token does not match the command's token.
    #[error("Invalid token {token:?} for command {command:?}")]
    Unauthorized { command: String, token: String },

    /// The handler returned an error.
    #[error("{0}")]
    HandlerFailure(String),

    /// The command was marked public but no webhook URL is configured.
    #[error("no webhook url specified to post command publicly")]
    WebhookNotConfigured,

    /// The webhook POST failed in transport (connect, timeout, ...).
    #[error("error sending public message: {0}")]
    WebhookDeliveryFailed(String),

    /// The webhook answered with something other than 200.
    #[error("webhook rejected public message with {status}: {body}")]
    WebhookRejected { status: u16, body: String },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::MissingCommand | Self::UnknownCommand(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::HandlerFailure(_)
            | Self::WebhookNotConfigured
            | Self::WebhookDeliveryFailed(_)
            | Self::WebhookRejected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_command() {
        let err = DispatchError::MissingCommand;
        assert_eq!(err.to_string(), "command required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_display_unknown_command_hides_name() {
        let err = DispatchError::UnknownCommand("nope".to_string());
        assert_eq!(err.to_string(), "Invalid command");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_display_unauthorized() {
        let err = DispatchError::Unauthorized {
            command: "hello".to_string(),
            token: "non-foo".to_string(),
        };
        assert_eq!(err.to_string(), r#"Invalid token "non-foo" for command "hello""#);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn error_display_handler_failure() {
        let err = DispatchError::HandlerFailure("something exploded".to_string());
        assert_eq!(err.to_string(), "something exploded");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_display_webhook_rejected() {
        let err = DispatchError::WebhookRejected {
            status: 403,
            body: "invalid_token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "webhook rejected public message with 403: invalid_token"
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_malformed_is_client_error() {
        let err = DispatchError::MalformedRequest("invalid percent-encoding".to_string());
        assert_eq!(err.to_string(), "Invalid request body");
        assert!(err.status().is_client_error());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchError>();
    }
}
