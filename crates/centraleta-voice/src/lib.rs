//! Remote voice services and audio asset storage for Centraleta.
//!
//! Provides the concrete collaborators the turn engine talks to through its
//! traits: a chat-completion client that turns caller speech into assistant
//! replies, a speech-synthesis client that renders replies to MP3 and
//! stores them as publicly served assets, and the filesystem asset store
//! with its age-based sweep.

pub mod chat;
pub mod store;
pub mod tts;

pub use chat::ChatTranslator;
pub use store::{AssetStore, SweepError};
pub use tts::{SpeechSynthesizer, AUDIO_MOUNT};
