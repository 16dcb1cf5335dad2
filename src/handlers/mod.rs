// src/handlers/mod.rs
pub mod donation_handler;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(donation_handler::health))
        .route("/events/donations", post(donation_handler::donation_created))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::RecordingPushProvider;
    use crate::services::user_store::InMemoryUserStore;
    use crate::state::AppConfig;
    use serde_json::{Value, json};

    async fn serve(provider: Arc<RecordingPushProvider>) -> String {
        let config = AppConfig::from_lookup(|key| match key {
            "FIREBASE_DATABASE_URL" => Some("https://share.firebaseio.com/".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::with_services(config, Arc::new(InMemoryUserStore::default()), provider);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state))).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_rejected() {
        let provider = Arc::new(RecordingPushProvider::default());
        let base = serve(provider.clone()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/events/donations", base))
            .header("Content-Type", "application/json")
            .body(r#"{"data": {"title": "Bread"}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "bad_request");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_event_round_trip_over_http() {
        let provider = Arc::new(RecordingPushProvider::default());
        let base = serve(provider.clone()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/events/donations", base))
            .json(&json!({"donation_id": "don-1", "data": {"title": "Bread", "latitude": 10.0, "longitude": 10.0}}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "no_recipients");

        let health: Value = reqwest::get(format!("{}/health", base)).await.unwrap().json().await.unwrap();
        assert_eq!(health, json!({"status": "ok"}));
    }
}
