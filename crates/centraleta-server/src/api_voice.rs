//! HTTP handlers for the telephony webhook and liveness endpoints.

use crate::{twiml, AppState};
use axum::{
    extract::Extension,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form, Json,
};
use centraleta_dialog::TurnRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// `GET /` — plain-text liveness line.
pub async fn root() -> &'static str {
    "Verònica - Assistència telefònica intel·ligent està activa."
}

/// `GET /health` — status and version for monitoring.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Webhook form posted by the telephony provider on every call turn.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhook {
    /// Call session identifier.
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    /// Transcribed caller speech; absent on the call's opening turn.
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// Base URL of the inbound request, derived from forwarding headers.
///
/// Telephony webhooks arrive through a TLS-terminating proxy, so the scheme
/// defaults to https unless the proxy says otherwise.
fn request_base(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    Some(format!("{scheme}://{host}"))
}

/// `POST /voice` — one call turn.
///
/// Always answers `200` with a TwiML document; every failure inside the
/// turn has already been converted to a scripted utterance by the engine.
pub async fn voice_webhook(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<VoiceWebhook>,
) -> Response {
    info!(
        call_sid = form.call_sid.as_deref().unwrap_or(""),
        has_utterance = form.speech_result.is_some(),
        "call turn received"
    );

    let request = TurnRequest {
        call_sid: form.call_sid.unwrap_or_default(),
        utterance: form.speech_result,
        request_base: request_base(&headers),
    };

    let outcome = state.engine.handle_turn(request).await;
    let body = twiml::render_turn(&outcome, &state.twiml);

    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
