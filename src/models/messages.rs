// src/models/messages.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::donation::DonationEvent;

pub const NEARBY_ITEM_TITLE: &str = "New Free Item Nearby!";

/// Notification sent unchanged to every recipient of one donation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn for_donation(event: &DonationEvent) -> Self {
        Self::new(NEARBY_ITEM_TITLE, format!("{} is available near you.", event.title))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    InvalidToken(String),
    ProviderError(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenDelivery {
    pub token: String,
    pub outcome: DeliveryOutcome,
}

impl TokenDelivery {
    pub fn delivered(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            outcome: DeliveryOutcome::Delivered,
        }
    }

    pub fn invalid(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            outcome: DeliveryOutcome::InvalidToken(reason.into()),
        }
    }

    pub fn failed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            outcome: DeliveryOutcome::ProviderError(reason.into()),
        }
    }
}

/// Aggregated per-recipient outcome of one fanout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DispatchResult {
    pub deliveries: Vec<TokenDelivery>,
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchResult {
    pub fn new(deliveries: Vec<TokenDelivery>) -> Self {
        Self {
            deliveries,
            dispatched_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn recipients(&self) -> usize {
        self.deliveries.len()
    }

    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Delivered))
    }

    pub fn invalid_tokens(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::InvalidToken(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::ProviderError(_)))
    }

    fn count(&self, predicate: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.deliveries.iter().filter(|d| predicate(&d.outcome)).count()
    }
}
