// src/state.rs
use std::sync::Arc;

use crate::{
    errors::{NotifyError, NotifyResult},
    services::{
        donation_trigger::DonationTrigger,
        messaging_service::{FcmConfig, FcmPushProvider, MockPushProvider, PushProvider},
        user_store::{FirebaseUserStore, UserStore},
    },
};

pub struct AppState {
    pub trigger: DonationTrigger,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub firebase_database_url: String,
    pub firebase_auth_token: Option<String>,
    pub fcm_server_key: Option<String>,
    pub fcm_url: String,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> NotifyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> NotifyResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let firebase_database_url = non_empty("FIREBASE_DATABASE_URL")
            .ok_or_else(|| NotifyError::MissingEnvironmentVariable("FIREBASE_DATABASE_URL".to_string()))?;

        Ok(Self {
            firebase_database_url,
            firebase_auth_token: non_empty("FIREBASE_AUTH_TOKEN"),
            fcm_server_key: non_empty("FCM_SERVER_KEY"),
            fcm_url: non_empty("FCM_URL").unwrap_or_else(|| FcmConfig::default().fcm_url),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> NotifyResult<Self> {
        let user_store = Arc::new(FirebaseUserStore::new(
            &config.firebase_database_url,
            config.firebase_auth_token.as_deref(),
        )?);

        let provider: Arc<dyn PushProvider> = match &config.fcm_server_key {
            Some(server_key) => Arc::new(FcmPushProvider::new(FcmConfig {
                fcm_server_key: server_key.clone(),
                fcm_url: config.fcm_url.clone(),
            })),
            None => {
                tracing::warn!("FCM_SERVER_KEY not set, using mock push provider");
                Arc::new(MockPushProvider)
            }
        };

        Ok(Self::with_services(config, user_store, provider))
    }

    pub fn with_services(config: AppConfig, user_store: Arc<dyn UserStore>, provider: Arc<dyn PushProvider>) -> Self {
        Self {
            trigger: DonationTrigger::new(user_store, provider),
            config,
        }
    }
}
