use std::sync::Arc;

use nearby_fanout::{
    NotifyError,
    handlers,
    state::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> Result<(), NotifyError> {
    tracing_subscriber::fmt().with_target(true).init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config)?;

    let app = handlers::router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| NotifyError::InvalidConfiguration(format!("cannot bind {}: {}", bind_addr, e)))?;
    tracing::info!("Listening for donation events on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| NotifyError::internal_error(e.to_string()))
}
