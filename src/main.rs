//! Practice Catalog · Backend
//!
//! - Axum HTTP API under `/api/practice`
//! - In-memory catalog, seeded from TOML config and/or built-in demo content
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   CATALOG_CONFIG_PATH : path to TOML config (users + starting content)
//!   CATALOG_TOKENS      : extra users as "id:token,id:token"
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use practice_catalog::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (catalog handle, users).
  let state = Arc::new(AppState::new().await);

  // HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "practice_catalog", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "practice_catalog", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
