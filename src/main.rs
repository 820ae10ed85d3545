//! Taxi service binary: reads settings, prepares the store, serves the app.

use taxi_service::{app, init_schema, store, AppState, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taxi_service=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = store::connect(&settings).await?;
    init_schema(&pool).await?;
    if let Some(seed) = &settings.admin {
        store::seed_admin(&pool, seed).await?;
    }

    let listener = TcpListener::bind(settings.bind_addr).await?;
    let state = AppState::new(pool, settings);
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
