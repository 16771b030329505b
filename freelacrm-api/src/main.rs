//! # FreelaCRM API Server
//!
//! Serves the FreelaCRM REST API: accounts and sessions, clients, tasks and
//! payments scoped to the signed-in freelancer, with plan-based quotas.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p freelacrm-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps its data in memory.

use std::sync::Arc;

use anyhow::Context;
use freelacrm_api::{
    app::{build_router, AppState},
    config::Config,
};
use freelacrm_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    notify::{HttpMailer, LogMailer, Mailer},
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "freelacrm_api=debug,freelacrm_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG and LOG_FORMAT may come from .env
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "FreelaCRM API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = match &config.database {
        Some(database) => {
            let pool = create_pool(DatabaseConfig {
                max_connections: database.max_connections,
                ..DatabaseConfig::new(&database.url)
            })
            .await
            .context("connecting to the database")?;
            run_migrations(&pool).await.context("running migrations")?;
            Some(pool)
        }
        None => None,
    };

    let store: Arc<dyn Store> = match &pool {
        Some(pool) => Arc::new(PgStore::new(pool.clone())),
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.relay_url {
        Some(url) => Arc::new(HttpMailer::new(
            url,
            &config.mail.from,
            &config.mail.reset_url_base,
        )),
        None => Arc::new(LogMailer::new(&config.mail.from, &config.mail.reset_url_base)),
    };

    let address = config.bind_address();
    let app = build_router(AppState::new(store, mailer, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
