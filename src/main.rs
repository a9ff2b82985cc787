//! Question Maker · Backend
//!
//! - Axum HTTP API over an exam -> course -> subject -> unit -> chapter -> topic catalog
//! - AI question generation (Gemini) with API-key rotation, persisted to Supabase
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   CORS_ORIGINS        : comma separated origins (default "*")
//!   SUPABASE_URL        : Supabase project URL (required)
//!   SUPABASE_ANON_KEY   : Supabase API key (required)
//!   GEMINI_API_KEYS     : comma separated Gemini keys, rotated round-robin
//!   GEMINI_BASE_URL     : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL        : default "gemini-2.0-flash"
//!   GEMINI_TIMEOUT_SECS : transport timeout for model calls (default 60)
//!   PROMPTS_CONFIG_PATH : path to TOML prompt overrides
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod catalog;
mod config;
mod domain;
mod error;
mod gemini;
mod generator;
mod model;
mod parse;
mod prompt;
mod protocol;
mod rotator;
mod routes;
mod state;
mod telemetry;
mod util;
mod validate;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = Config::from_env()?;

  // Shared application state (catalog store, generator, key rotator).
  let state = Arc::new(AppState::from_config(&cfg)?);

  // Routes, CORS and tracing layers.
  let app = build_router(state, &cfg.cors_origins);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "question_maker", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "question_maker", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "question_maker", "Shutdown signal received");
}
