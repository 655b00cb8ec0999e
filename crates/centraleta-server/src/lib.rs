//! Centraleta server library logic.
//!
//! Wires the turn engine to the telephony webhook: inbound call turns are
//! handled on `POST /voice`, synthesized audio is served statically under
//! `/audio`, and background tasks sweep expired assets and idle call
//! sessions.

pub mod api_voice;
pub mod background;
pub mod config;
pub mod twiml;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use centraleta_dialog::TurnEngine;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use twiml::TwimlSettings;

/// Application state shared across all request handlers.
pub struct AppState {
    /// The call-turn engine.
    pub engine: TurnEngine,
    /// Reply-document rendering settings.
    pub twiml: TwimlSettings,
}

/// Builds the application router with all routes.
pub fn app(state: Arc<AppState>, assets_dir: &Path) -> Router {
    Router::new()
        .route("/", get(api_voice::root))
        .route("/health", get(api_voice::health))
        .route("/voice", post(api_voice::voice_webhook))
        .nest_service(
            centraleta_voice::AUDIO_MOUNT,
            ServeDir::new(assets_dir),
        )
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
