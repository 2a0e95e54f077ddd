use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visitline_api::{
    app,
    state::{AppState, AuthConfig, Clock},
};
use visitline_store::{app_config::Config, EventProducer, OrchestrationClient, RedisSessionStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "visitline_api=debug,visitline_journey=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Visitline API on port {}", config.server.port);

    let sessions = RedisSessionStore::new(&config.redis.url, config.redis.session_ttl_seconds)
        .await
        .expect("Failed to connect to Redis");

    let audit = EventProducer::new(&config.kafka.brokers, &config.kafka.audit_topic)
        .expect("Failed to create Kafka producer");

    // One client serves both the reservation and the directory endpoints.
    let orchestration = Arc::new(
        OrchestrationClient::new(
            &config.orchestration.base_url,
            Duration::from_secs(config.orchestration.timeout_seconds),
        )
        .expect("Failed to build orchestration client"),
    );

    let app_state = AppState {
        sessions: Arc::new(sessions),
        reservations: orchestration.clone(),
        directory: orchestration,
        audit: Arc::new(audit),
        rules: config.journey.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        clock: Clock::System,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
