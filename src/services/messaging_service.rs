// src/services/messaging_service.rs
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing;

use crate::{
    errors::NotifyError as AppError,
    models::messages::{DispatchResult, NotificationPayload, TokenDelivery},
};

/// Registration ids accepted by one FCM multicast request.
pub const FCM_MAX_BATCH: usize = 1000;

/// Why a single token was not delivered to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid device token: {0}")]
    InvalidToken(String),

    #[error("FCM send failed: {0}")]
    Provider(String),
}

impl DeliveryError {
    /// Maps an FCM per-message error code.
    pub fn from_fcm_reason(reason: &str) -> Self {
        match reason {
            "InvalidRegistration" | "NotRegistered" | "MissingRegistration" | "MismatchSenderId" => {
                Self::InvalidToken(reason.to_string())
            }
            _ => Self::Provider(reason.to_string()),
        }
    }

    fn into_delivery(self, token: &str) -> TokenDelivery {
        match self {
            Self::InvalidToken(reason) => TokenDelivery::invalid(token, reason),
            Self::Provider(reason) => TokenDelivery::failed(token, reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub fcm_server_key: String,
    pub fcm_url: String,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            fcm_server_key: String::new(),
            fcm_url: "https://fcm.googleapis.com/fcm/send".to_string(),
        }
    }
}

/// The push-messaging provider. Only the dispatcher talks to it.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Sends one request for `tokens`, returning an outcome per token in the same order.
    ///
    /// `Err` means the request as a whole failed.
    async fn send_batch(&self, tokens: &[String], payload: &NotificationPayload) -> Result<Vec<TokenDelivery>, AppError>;

    fn max_batch_size(&self) -> usize {
        FCM_MAX_BATCH
    }
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmMessageResult>,
}

#[derive(Debug, Deserialize)]
struct FcmMessageResult {
    message_id: Option<String>,
    error: Option<String>,
}

impl FcmMessageResult {
    fn into_result(self) -> Result<(), DeliveryError> {
        match (self.message_id, self.error) {
            (_, Some(reason)) => Err(DeliveryError::from_fcm_reason(&reason)),
            (Some(_), None) => Ok(()),
            (None, None) => Err(DeliveryError::Provider("Empty result".to_string())),
        }
    }
}

pub struct FcmPushProvider {
    config: FcmConfig,
    client: reqwest::Client,
}

impl FcmPushProvider {
    pub fn new(config: FcmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_message(tokens: &[String], payload: &NotificationPayload) -> serde_json::Value {
        json!({
            "registration_ids": tokens,
            "notification": {
                "title": payload.title,
                "body": payload.body,
                "sound": "default"
            },
            "priority": "high"
        })
    }

    fn collect_results(tokens: &[String], response: FcmResponse) -> Vec<TokenDelivery> {
        let mut results = response.results.into_iter();
        tokens
            .iter()
            .map(|token| {
                let result = results
                    .next()
                    .map(FcmMessageResult::into_result)
                    .unwrap_or_else(|| Err(DeliveryError::Provider("Missing result".to_string())));
                match result {
                    Ok(()) => TokenDelivery::delivered(token.as_str()),
                    Err(e) => e.into_delivery(token),
                }
            })
            .collect()
    }
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    async fn send_batch(&self, tokens: &[String], payload: &NotificationPayload) -> Result<Vec<TokenDelivery>, AppError> {
        tracing::info!("Sending FCM notification to {} devices", tokens.len());

        let response = self
            .client
            .post(&self.config.fcm_url)
            .header("Authorization", format!("key={}", self.config.fcm_server_key))
            .header("Content-Type", "application/json")
            .json(&Self::build_message(tokens, payload))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("FCM request failed with {}: {}", status, error_text);
            return Err(AppError::FcmDelivery(format!("{}: {}", status, error_text)));
        }

        let text = response.text().await?;
        let body: FcmResponse = serde_json::from_str(&text)?;
        Ok(Self::collect_results(tokens, body))
    }
}

// Mock provider for development without FCM credentials
#[derive(Debug)]
pub struct MockPushProvider;

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send_batch(&self, tokens: &[String], payload: &NotificationPayload) -> Result<Vec<TokenDelivery>, AppError> {
        tracing::info!(
            "[MOCK] Would send FCM to {} devices: {} - {}",
            tokens.len(),
            payload.title,
            payload.body
        );
        Ok(tokens.iter().map(|t| TokenDelivery::delivered(t.as_str())).collect())
    }
}

/// Delivers one payload to a set of recipient tokens in as few provider requests as possible.
pub struct FanoutDispatcher {
    provider: Arc<dyn PushProvider>,
}

impl FanoutDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Sends `payload` to every recipient. No request is made when there are none.
    ///
    /// Chunks are sent concurrently. A chunk whose request fails marks its tokens as provider
    /// errors; only when every chunk fails is the whole dispatch an error. Nothing is retried.
    pub async fn dispatch(&self, recipients: &[String], payload: &NotificationPayload) -> Result<DispatchResult, AppError> {
        if recipients.is_empty() {
            return Ok(DispatchResult::empty());
        }

        let chunk_size = self.provider.max_batch_size().max(1);
        let sends = recipients
            .chunks(chunk_size)
            .map(|chunk| self.provider.send_batch(chunk, payload));
        let responses = join_all(sends).await;

        let mut deliveries = Vec::with_capacity(recipients.len());
        let mut any_sent = false;
        let mut last_error = None;

        for (chunk, response) in recipients.chunks(chunk_size).zip(responses) {
            match response {
                Ok(batch) => {
                    any_sent = true;
                    deliveries.extend(batch);
                }
                Err(e) => {
                    tracing::error!("Push batch of {} tokens failed: {}", chunk.len(), e);
                    let reason = e.to_string();
                    deliveries.extend(chunk.iter().map(|t| TokenDelivery::failed(t.as_str(), reason.as_str())));
                    last_error = Some(reason);
                }
            }
        }

        if !any_sent {
            return Err(AppError::provider_unavailable(last_error.unwrap_or_default()));
        }

        let result = DispatchResult::new(deliveries);
        tracing::info!(
            "Fanout complete: {} delivered, {} invalid tokens, {} failed",
            result.delivered(),
            result.invalid_tokens(),
            result.failed()
        );
        Ok(result)
    }
}
