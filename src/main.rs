//! Piatto - conversational order-taking engine
//!
//! Turns free-text customer utterances into validated, persisted orders.
//! The dialogue state machine resolves what it can deterministically and
//! delegates the rest to an LLM collaborator whose replies may carry
//! order directives.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod providers;
mod routes;

use crate::core::{DialogueEngine, OrderLog};
use config::{Config, MenuCatalog};
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "piatto_ai=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let catalog = MenuCatalog::from_file(&config.menu_path)
        .map_err(|e| anyhow::anyhow!("failed to load menu from {:?}: {e}", config.menu_path))?;
    tracing::info!(
        categories = catalog.categories().len(),
        flavors = catalog.flavors().len(),
        "menu loaded"
    );

    let log = Arc::new(OrderLog::new(&config.data_dir.join("orders.db")).await?);

    let llm = providers::from_config(&config)?;
    tracing::info!(provider = %config.provider, model = %config.model, "LLM provider ready");

    let engine = Arc::new(DialogueEngine::new(
        catalog,
        llm,
        log,
        config.transcript_cap,
    ));

    let state = AppState::new(engine);

    let app = axum::Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Piatto order line open at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
