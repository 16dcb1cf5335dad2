// src/services/mod.rs
pub mod candidate_selector;
pub mod donation_trigger;
pub mod messaging_service;
pub mod user_store;

pub use candidate_selector::{NOTIFY_RADIUS_KM, select_recipients};
pub use donation_trigger::{DonationTrigger, TriggerOutcome};
pub use messaging_service::{FanoutDispatcher, FcmPushProvider, MockPushProvider, PushProvider};
pub use user_store::{FirebaseUserStore, InMemoryUserStore, UserStore};
