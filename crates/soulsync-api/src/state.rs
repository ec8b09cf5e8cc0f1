use std::sync::Arc;

use tracing::error;

use soulsync_db::Database;

use crate::error::AppError;

/// Application context, built once in `main` and handed to every handler.
pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Signs session tokens.
    pub secret_key: String,
}

impl AppStateInner {
    pub fn new(db: Database, secret_key: impl Into<String>) -> AppState {
        Arc::new(Self {
            db,
            secret_key: secret_key.into(),
        })
    }
}

/// Run blocking database work off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppStateInner) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(e.to_string())
        })?
}
