//! Shared plain-data types for the Centraleta platform.

pub mod conversation;
pub mod voice;

pub use conversation::{Role, Turn};
pub use voice::SynthesisSettings;
