use thiserror::Error;

/// Failures that can occur while driving one call turn.
///
/// All of these are absorbed at the turn boundary and converted into a
/// scripted utterance; none propagate to the transport layer.
#[derive(Error, Debug)]
pub enum TurnError {
    /// A required credential or identity is absent. Raised before any
    /// network call is attempted.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    /// The remote chat-completion call failed.
    #[error("translation failed: {0}")]
    TranslationFailed(String),

    /// The remote speech-synthesis call failed.
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// The synthesized audio could not be written to durable storage.
    #[error("failed to write audio asset: {0}")]
    AssetWriteFailed(String),
}
