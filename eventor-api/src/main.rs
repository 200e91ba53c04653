use anyhow::Context;
use eventor_api::{
    app,
    state::{AppState, AuthConfig},
};
use eventor_booking::SimulatedGateway;
use eventor_store::{Config, DbClient, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventor_api=debug,eventor_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting EventOR API on port {}", config.server.port);

    let store = match (&config.database.url, config.database.in_memory) {
        (_, true) => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Some(Store::in_memory())
        }
        (Some(url), false) => {
            let db = DbClient::connect_lazy(&config.database, url)
                .context("Invalid database configuration")?;
            if config.database.run_migrations {
                if let Err(e) = db.migrate().await {
                    tracing::warn!("Migrations did not run, continuing: {}", e);
                }
            }
            Some(Store::postgres(&db))
        }
        (None, false) => {
            tracing::warn!("No database configured; data endpoints will answer 503");
            None
        }
    };

    let app_state = AppState::new(
        store,
        Arc::new(SimulatedGateway::from_config(&config.payments)),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            session_days: config.auth.session_days,
            cookie_secure: config.auth.cookie_secure,
        },
        config.admin.emails.clone(),
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
