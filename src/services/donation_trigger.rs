// src/services/donation_trigger.rs
use std::sync::Arc;
use tracing::{self, Instrument};
use uuid::Uuid;

use crate::{
    models::{
        donation::{DonationCreated, DonationEvent},
        messages::{DispatchResult, NotificationPayload},
    },
    services::{
        candidate_selector::{NOTIFY_RADIUS_KM, select_recipients},
        messaging_service::{FanoutDispatcher, PushProvider},
        user_store::UserStore,
    },
};

/// How a single trigger run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    NotGeolocatable,
    NoRecipients,
    Dispatched(DispatchResult),
    Failed(String),
}

impl TriggerOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            TriggerOutcome::NotGeolocatable => "not_geolocatable",
            TriggerOutcome::NoRecipients => "no_recipients",
            TriggerOutcome::Dispatched(_) => "dispatched",
            TriggerOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TriggerOutcome::Failed(_))
    }
}

/// Entry point run once per donation creation: select nearby users, then fan out.
///
/// Runs share no mutable state, so concurrent donations can be handled concurrently.
/// Redelivering the same event repeats the same notification.
pub struct DonationTrigger {
    user_store: Arc<dyn UserStore>,
    dispatcher: FanoutDispatcher,
}

impl DonationTrigger {
    pub fn new(user_store: Arc<dyn UserStore>, provider: Arc<dyn PushProvider>) -> Self {
        Self {
            user_store,
            dispatcher: FanoutDispatcher::new(provider),
        }
    }

    pub async fn handle(&self, created: &DonationCreated) -> TriggerOutcome {
        self.on_donation_created(&created.donation_id, &created.event()).await
    }

    /// Never fails past this point; store and provider failures come back as `Failed`.
    pub async fn on_donation_created(&self, donation_id: &str, event: &DonationEvent) -> TriggerOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("donation_created", donation_id = %donation_id, run_id = %run_id);
        self.run(donation_id, event).instrument(span).await
    }

    async fn run(&self, donation_id: &str, event: &DonationEvent) -> TriggerOutcome {
        if !event.is_geolocatable() {
            tracing::debug!("Donation {} has no coordinates, skipping", donation_id);
            return TriggerOutcome::NotGeolocatable;
        }

        let users = match self.user_store.snapshot().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("Failed to read users for donation {}: {}", donation_id, e);
                return TriggerOutcome::Failed(e.to_string());
            }
        };

        let recipients = select_recipients(event, &users, NOTIFY_RADIUS_KM);
        if recipients.is_empty() {
            tracing::info!("No users near donation {}", donation_id);
            return TriggerOutcome::NoRecipients;
        }

        let payload = NotificationPayload::for_donation(event);
        tracing::info!("Notifying {} users near donation {}", recipients.len(), donation_id);

        match self.dispatcher.dispatch(&recipients, &payload).await {
            Ok(result) => TriggerOutcome::Dispatched(result),
            Err(e) => {
                tracing::error!("Fanout failed for donation {}: {}", donation_id, e);
                TriggerOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRecord;
    use crate::services::test_support::{RecordingPushProvider, UnreachableUserStore};
    use crate::services::user_store::InMemoryUserStore;

    fn bread() -> DonationEvent {
        DonationEvent::new("Bread", Some(10.0), Some(10.0))
    }

    fn neighbourhood() -> Vec<UserRecord> {
        vec![
            UserRecord::new(Some(10.0), Some(10.0), Some("t1")),
            UserRecord::new(Some(20.0), Some(20.0), Some("t2")),
            UserRecord::new(Some(10.01), Some(10.01), Some("t3")),
        ]
    }

    fn trigger(users: Vec<UserRecord>, provider: Arc<RecordingPushProvider>) -> DonationTrigger {
        DonationTrigger::new(Arc::new(InMemoryUserStore::new(users)), provider)
    }

    #[tokio::test]
    async fn test_end_to_end_dispatch() {
        let provider = Arc::new(RecordingPushProvider::default());
        let trigger = trigger(neighbourhood(), provider.clone());

        let outcome = trigger.on_donation_created("don-1", &bread()).await;
        assert_eq!(outcome.status(), "dispatched");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);

        let (mut tokens, payload) = calls[0].clone();
        tokens.sort();
        assert_eq!(tokens, vec!["t1".to_string(), "t3".to_string()]);
        assert_eq!(
            payload,
            NotificationPayload::new("New Free Item Nearby!", "Bread is available near you.")
        );
    }

    #[tokio::test]
    async fn test_missing_latitude_makes_no_provider_call() {
        let provider = Arc::new(RecordingPushProvider::default());
        let trigger = trigger(neighbourhood(), provider.clone());

        let event = DonationEvent::new("Bread", None, Some(10.0));
        let outcome = trigger.on_donation_created("don-2", &event).await;

        assert_eq!(outcome, TriggerOutcome::NotGeolocatable);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_nearby_users_makes_no_provider_call() {
        let provider = Arc::new(RecordingPushProvider::default());
        let users = vec![
            UserRecord::new(Some(20.0), Some(20.0), Some("far")),
            UserRecord::new(Some(10.0), Some(10.0), None),
        ];
        let trigger = trigger(users, provider.clone());

        let outcome = trigger.on_donation_created("don-3", &bread()).await;
        assert_eq!(outcome, TriggerOutcome::NoRecipients);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_redelivery_repeats_identical_dispatch() {
        let provider = Arc::new(RecordingPushProvider::default());
        let trigger = trigger(neighbourhood(), provider.clone());

        trigger.on_donation_created("don-4", &bread()).await;
        trigger.on_donation_created("don-4", &bread()).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_without_fanout() {
        let provider = Arc::new(RecordingPushProvider::default());
        let trigger = DonationTrigger::new(Arc::new(UnreachableUserStore), provider.clone());

        let outcome = trigger.on_donation_created("don-5", &bread()).await;
        assert!(outcome.is_failure());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_outage_is_reported() {
        let provider = Arc::new(RecordingPushProvider::failing());
        let trigger = trigger(neighbourhood(), provider.clone());

        let outcome = trigger.on_donation_created("don-6", &bread()).await;
        assert!(matches!(outcome, TriggerOutcome::Failed(ref msg) if msg.contains("Push provider unavailable")));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_handle_reads_envelope() {
        let provider = Arc::new(RecordingPushProvider::default().reject_token("t3"));
        let trigger = trigger(neighbourhood(), provider.clone());

        let created: DonationCreated = serde_json::from_value(serde_json::json!({
            "donation_id": "don-7",
            "data": {"title": "Bread", "latitude": 10.0, "longitude": 10.0, "category": "food"}
        }))
        .unwrap();

        match trigger.handle(&created).await {
            TriggerOutcome::Dispatched(result) => {
                assert_eq!(result.delivered(), 1);
                assert_eq!(result.invalid_tokens(), 1);
            }
            other => panic!("Expected Dispatched, got {:?}", other),
        }
    }
}
