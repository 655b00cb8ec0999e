//! Call-turn orchestration for the Centraleta voice assistant.
//!
//! A phone call proceeds as a sequence of webhook turns. This crate owns the
//! per-call conversation state and the state machine that drives one turn:
//! deciding whether a request opens a call or continues one, keeping the
//! conversation history bounded, sequencing the chat translation and speech
//! synthesis, and absorbing every failure into a scripted reply so that a
//! turn always answers.
//!
//! The remote collaborators (chat completion, speech synthesis) are reached
//! through the [`Translator`] and [`Synthesizer`] traits; the HTTP layer and
//! the concrete clients live in sibling crates.

pub mod engine;
pub mod error;
pub mod history;
pub mod session;

pub use engine::{EngineSettings, Playback, Synthesizer, Translator, TurnEngine, TurnRequest, TurnResponse};
pub use error::TurnError;
pub use history::ConversationHistory;
pub use session::SessionStore;
