mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use yelpcamp_db::Database;
use yelpcamp_web::auth::Authenticator;
use yelpcamp_web::session::cookie::SessionKey;
use yelpcamp_web::session::{SessionConfig, SessionManager, SessionStore};
use yelpcamp_web::{AppState, AppStateInner, build_app};

use crate::config::Config;

const CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yelpcamp=debug,yelpcamp_web=debug,tower_http=debug".into()),
        )
        .init();

    // Config and database failures exit before a port is bound.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    if config.secret_is_default {
        warn!("SECRET is not set, sessions are signed with an insecure default");
    }

    let db = match Database::open_url(&config.db_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("FATAL: cannot open database: {:#}", e);
            std::process::exit(1);
        }
    };

    // Shared state
    let store: Arc<dyn SessionStore> = db.clone();
    let sessions = SessionManager::new(
        store,
        SessionKey::new(&config.secret)?,
        SessionConfig {
            touch_after: Duration::seconds(config.touch_after_secs),
            secure: config.cookie_secure,
            ..SessionConfig::default()
        },
    );
    let state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        sessions,
        auth: Authenticator::new()?,
        static_dir: config.static_dir.clone(),
    });

    tokio::spawn(cleanup::run_cleanup_loop(db, CLEANUP_INTERVAL_SECS));

    let app = build_app(state)?;

    let addr: SocketAddr = config.addr().parse()?;
    info!("YelpCamp listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
