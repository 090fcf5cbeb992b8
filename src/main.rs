use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod audit;
mod bookkeeper;
mod clock;
mod credential;
mod guard;
mod hierarchy;
mod model;
mod session;
mod store;

use api::AppState;
use bookkeeper::Bookkeeper;
use store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let db_path = std::env::var("SENSORHUB_DB").unwrap_or_else(|_| "sensorhub-db".into());
    let addr = std::env::var("SENSORHUB_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store = Arc::new(Store::new(&db_path)?);
    let bookkeeper = Bookkeeper::new(store.clone(), 64);
    let state = AppState { store, bookkeeper };

    // -----------------------------
    // Router
    // -----------------------------
    let app = api::router()
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    println!("🚀 Starting sensorhub API server...");
    println!("🌐 HTTP listening on http://{addr} (routes under /api/v1)");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
