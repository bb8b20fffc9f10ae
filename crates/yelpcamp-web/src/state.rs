use std::path::PathBuf;
use std::sync::Arc;

use tracing::error;
use yelpcamp_db::Database;

use crate::auth::Authenticator;
use crate::error::AppError;
use crate::session::SessionManager;

pub type AppState = Arc<AppStateInner>;

/// Handles shared by every request, passed through axum state.
pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: SessionManager,
    pub auth: Authenticator,
    pub static_dir: PathBuf,
}

/// Runs blocking database or hashing work off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppStateInner) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(e.into())
        })?
        .map_err(AppError::Internal)
}
