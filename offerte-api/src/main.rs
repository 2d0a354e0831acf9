use anyhow::Context;
use offerte_api::{app_with_cors, AppState, AuthConfig};
use offerte_store::{Config, DbClient, InMemoryStore, RedisClient};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offerte_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Offerte API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    let mut app_state = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            AppState::postgres(&db, auth)
        }
        None => {
            tracing::warn!("No database.url configured, using the in-memory store");
            AppState::in_memory(InMemoryStore::new(), auth)
        }
    };

    if let Some(url) = &config.redis.url {
        let redis = RedisClient::new(url).await.context("Invalid Redis URL")?;
        app_state = app_state.with_rate_limit(redis, config.rate_limit.clone());
        tracing::info!(
            "Rate limiting enabled: {} requests per {}s",
            config.rate_limit.requests,
            config.rate_limit.window_seconds
        );
    }

    let app = app_with_cors(app_state, &config.server.cors_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;

    Ok(())
}
