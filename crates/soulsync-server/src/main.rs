use std::net::SocketAddr;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing::{error, info};

use soulsync_api::{AppState, AppStateInner};
use soulsync_db::Database;

use soulsync_server::config::Config;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soulsync=debug,soulsync_api=debug,soulsync_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::connect(&config.database_url)?;

    // Shared state
    let state = AppStateInner::new(db, config.secret_key);

    spawn_session_purge(state.clone());

    let app = soulsync_api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("SoulSync listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete expired session rows.
fn spawn_session_purge(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let state = state.clone();
            let result = tokio::task::spawn_blocking(move || {
                state.db.delete_expired_sessions(chrono::Utc::now())
            })
            .await;
            match result {
                Ok(Ok(0)) => {}
                Ok(Ok(n)) => info!("Purged {} expired sessions", n),
                Ok(Err(e)) => error!("Session purge failed: {}", e),
                Err(e) => error!("spawn_blocking join error: {}", e),
            }
        }
    });
}
