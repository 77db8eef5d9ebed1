//! Example consumer: loads the table allowlist, connects the pool, serves `/rest/:table`.
//!
//! Run from repo root: `cargo run -p example-consumer`

use std::sync::Arc;
use tenant_rest::{
    common_routes_with_ready, connect_pool, database_url, init_tracing, load_from_env, rest_routes, AppState,
    TableCatalog, TracingChangeSink,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("tenant_rest=info,example_consumer=info");

    let config = load_from_env()?;
    let catalog = TableCatalog::from_config(&config)?;
    let pool = connect_pool(&database_url(), &config.pool).await?;
    let state = AppState::new(pool, catalog, Arc::new(TracingChangeSink));

    let app = axum::Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", rest_routes(state));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
