//! Speech-synthesis voice configuration.
//!
//! These values are passed through to the remote TTS provider unchanged;
//! the platform applies no logic to them.

use serde::{Deserialize, Serialize};

/// Voice identity and synthesis quality parameters for the TTS provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Provider voice identity. Required for synthesis.
    pub voice_id: String,
    /// Provider synthesis model.
    pub model_id: String,
    /// Voice stability, 0.0–1.0.
    pub stability: f32,
    /// Similarity boost, 0.0–1.0.
    pub similarity_boost: f32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.4,
            similarity_boost: 0.75,
        }
    }
}

impl SynthesisSettings {
    /// Whether a voice identity has been configured.
    pub fn has_voice(&self) -> bool {
        !self.voice_id.trim().is_empty()
    }
}
