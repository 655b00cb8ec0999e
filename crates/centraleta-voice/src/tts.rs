//! Speech-synthesis client: renders assistant text to a playable asset.

use crate::store::AssetStore;
use async_trait::async_trait;
use centraleta_dialog::{Synthesizer, TurnError};
use centraleta_types::SynthesisSettings;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default speech-synthesis endpoint base.
const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Public path the asset directory is served under.
pub const AUDIO_MOUNT: &str = "/audio";

/// Asset URL base used when neither a public base address nor an inbound
/// request host is available.
const FALLBACK_URL_BASE: &str = "http://localhost:3000";

/// Timeout for one synthesis call.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettingsBody,
}

/// Builds the public URL an asset is reachable at.
fn asset_url(base: &str, filename: &str) -> String {
    format!("{}{AUDIO_MOUNT}/{filename}", base.trim_end_matches('/'))
}

/// Client for an ElevenLabs-style text-to-speech endpoint.
///
/// Each successful call writes one new asset to the store and returns its
/// public URL. The returned bytes are stored as-is, no transcoding. No
/// retries; every failure is absorbed at the turn boundary.
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    settings: SynthesisSettings,
    store: AssetStore,
    public_base: Option<String>,
}

impl SpeechSynthesizer {
    /// Creates a synthesizer writing assets through `store`.
    ///
    /// `public_base` is the externally reachable address assets are served
    /// from; when `None`, each call falls back to the inbound request's own
    /// host. `api_base` falls back to the public ElevenLabs endpoint when
    /// empty; tests point it at a local stub.
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        settings: SynthesisSettings,
        store: AssetStore,
        public_base: Option<String>,
    ) -> Self {
        let api_base = api_base.into();
        let api_base = if api_base.trim().is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            api_base.trim_end_matches('/').to_string()
        };

        Self {
            client: reqwest::Client::builder()
                .timeout(SYNTHESIS_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base,
            settings,
            store,
            public_base: public_base.filter(|b| !b.trim().is_empty()),
        }
    }

    fn check_configuration(&self) -> Result<(), TurnError> {
        if self.api_key.trim().is_empty() {
            return Err(TurnError::ConfigurationMissing(
                "speech API key is not configured".to_string(),
            ));
        }
        if !self.settings.has_voice() {
            return Err(TurnError::ConfigurationMissing(
                "voice identity is not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn url_base<'a>(&'a self, request_base: Option<&'a str>) -> &'a str {
        self.public_base
            .as_deref()
            .or(request_base)
            .unwrap_or(FALLBACK_URL_BASE)
    }
}

#[async_trait]
impl Synthesizer for SpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        request_base: Option<&str>,
    ) -> Result<String, TurnError> {
        // Preconditions first; no network call unless they hold.
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::SynthesisFailed(
                "nothing to synthesize".to_string(),
            ));
        }
        self.check_configuration()?;

        let request = SynthesisRequest {
            text,
            model_id: &self.settings.model_id,
            voice_settings: VoiceSettingsBody {
                stability: self.settings.stability,
                similarity_boost: self.settings.similarity_boost,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}/stream",
                self.api_base, self.settings.voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TurnError::SynthesisFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TurnError::SynthesisFailed(format!(
                "synthesis endpoint returned {status}: {body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TurnError::SynthesisFailed(format!("failed to read audio: {e}")))?;

        let filename = self
            .store
            .store(&bytes)
            .await
            .map_err(|e| TurnError::AssetWriteFailed(e.to_string()))?;

        let url = asset_url(self.url_base(request_base), &filename);
        debug!(bytes = bytes.len(), %url, "synthesized utterance");
        Ok(url)
    }
}
