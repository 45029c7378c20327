//! Fabriq API Server
//!
//! Main entry point for the approval workflow backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabriq_api::{AppState, create_router};
use fabriq_db::{ServiceRoleHandle, connect};
use fabriq_shared::{AppConfig, JwtConfig, JwtService, NotificationClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabriq=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database: a caller-scoped pool plus the service-role pool
    // the approval stores run under. Both point at the same URL in local
    // development.
    let db = connect(&config.database.url).await?;
    let service_role_url = config
        .database
        .service_role_url
        .as_deref()
        .unwrap_or(&config.database.url);
    let service_role = ServiceRoleHandle::new(connect(service_role_url).await?);
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create notification client
    let notifier = NotificationClient::new(&config.notifier);
    if config.notifier.webhook_url.is_some() {
        info!("Notification webhook configured");
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        service_role,
        jwt_service: Arc::new(jwt_service),
        notifier: Arc::new(notifier),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
