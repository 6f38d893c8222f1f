use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::DispatchError;

/// Message posted to the incoming webhook for a public response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicMessage {
    pub text: String,
    pub channel: String,
}

impl PublicMessage {
    pub fn new(text: impl Into<String>, channel_name: &str) -> Self {
        Self {
            text: text.into(),
            channel: format!("#{channel_name}"),
        }
    }
}

pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `message` as JSON. Anything but a 200 is a rejection.
    pub async fn post(&self, message: &PublicMessage) -> Result<(), DispatchError> {
        debug!("Posting public message to {} for {}", self.url, message.channel);

        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| DispatchError::WebhookDeliveryFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to read webhook rejection body ({}): {}", status, e);
                    String::new()
                }
            };
            return Err(DispatchError::WebhookRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
