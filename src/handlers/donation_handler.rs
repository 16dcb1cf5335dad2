// src/handlers/donation_handler.rs
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    errors::{NotifyError, NotifyResult},
    models::donation::DonationCreated,
    services::donation_trigger::TriggerOutcome,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TriggerSummary {
    pub donation_id: String,
    pub status: String,
    pub recipients: usize,
    pub delivered: usize,
    pub invalid_tokens: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerSummary {
    pub fn from_outcome(donation_id: &str, outcome: &TriggerOutcome) -> Self {
        let mut summary = Self {
            donation_id: donation_id.to_string(),
            status: outcome.status().to_string(),
            recipients: 0,
            delivered: 0,
            invalid_tokens: 0,
            failed: 0,
            error: None,
        };

        match outcome {
            TriggerOutcome::Dispatched(result) => {
                summary.recipients = result.recipients();
                summary.delivered = result.delivered();
                summary.invalid_tokens = result.invalid_tokens();
                summary.failed = result.failed();
            }
            TriggerOutcome::Failed(message) => summary.error = Some(message.clone()),
            TriggerOutcome::NotGeolocatable | TriggerOutcome::NoRecipients => {}
        }

        summary
    }
}

/// Receives a donation-creation event from the change feed.
///
/// Malformed envelopes are rejected with 400. A failed run answers 502 so an
/// at-least-once sender redelivers the event.
pub async fn donation_created(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DonationCreated>, JsonRejection>,
) -> NotifyResult<(StatusCode, Json<TriggerSummary>)> {
    let Json(created) = payload.map_err(|rejection| NotifyError::bad_request(rejection.body_text()))?;

    if created.donation_id.trim().is_empty() {
        return Err(NotifyError::bad_request("donation_id must not be empty"));
    }

    tracing::info!("Received donation creation event: {}", created.donation_id);

    let outcome = state.trigger.handle(&created).await;
    let status = if outcome.is_failure() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };

    Ok((status, Json(TriggerSummary::from_outcome(&created.donation_id, &outcome))))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
