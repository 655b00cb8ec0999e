//! Centraleta server binary — the telephone voice-assistant webhook.
//!
//! Starts an axum HTTP server with structured logging, wires the chat and
//! speech clients into the turn engine, spawns the asset sweep and session
//! eviction tasks, and shuts down gracefully on SIGTERM/SIGINT.

use centraleta_dialog::{EngineSettings, SessionStore, TurnEngine};
use centraleta_server::twiml::TwimlSettings;
use centraleta_server::{app, background, config, AppState};
use centraleta_types::SynthesisSettings;
use centraleta_voice::{AssetStore, ChatTranslator, SpeechSynthesizer};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CENTRALETA_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    if config.chat.api_key.trim().is_empty() {
        tracing::warn!("chat API key is not configured; every turn will answer with the apology");
    }
    if config.speech.api_key.trim().is_empty() || config.speech.voice_id.trim().is_empty() {
        tracing::warn!("speech synthesis is not configured; replies will use the built-in voice");
    }

    // Wire the voice services into the turn engine
    let store = AssetStore::new(&config.assets.dir);
    let translator = ChatTranslator::new(
        &config.chat.api_key,
        &config.chat.api_base,
        &config.chat.model,
    );
    let synthesizer = SpeechSynthesizer::new(
        &config.speech.api_key,
        &config.speech.api_base,
        SynthesisSettings {
            voice_id: config.speech.voice_id.clone(),
            stability: config.speech.stability,
            similarity_boost: config.speech.similarity_boost,
            ..SynthesisSettings::default()
        },
        store.clone(),
        Some(config.assets.public_base_url.clone()).filter(|b| !b.trim().is_empty()),
    );

    let sessions = SessionStore::new(&config.assistant.persona);
    let engine = TurnEngine::new(
        Arc::new(translator),
        Arc::new(synthesizer),
        sessions.clone(),
        EngineSettings {
            greeting: config.assistant.greeting.clone(),
            apology: config.assistant.apology.clone(),
            history_limit: config.assistant.history_limit,
            synthesize_greeting: config.speech.synthesize_greeting,
            ..EngineSettings::default()
        },
    );

    // Background tasks
    tokio::spawn(background::start_asset_sweep_task(
        store.clone(),
        config.assets.sweep_interval_secs,
        Duration::from_secs(config.assets.retention_secs),
    ));
    tokio::spawn(background::start_session_eviction_task(
        sessions,
        Duration::from_secs(config.assistant.session_idle_timeout_secs),
    ));

    // Build application
    let state = Arc::new(AppState {
        engine,
        twiml: TwimlSettings {
            language: config.assistant.language.clone(),
            gather_timeout_secs: config.assistant.gather_timeout_secs,
        },
    });
    let app = app(state, Path::new(&config.assets.dir));
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting centraleta server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("centraleta server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
