//! Conversation history with a bounded context window.

use centraleta_types::{Role, Turn};

/// The ordered record of one call's conversation.
///
/// The first turn is always the system persona prompt and is never evicted.
/// Caller and assistant turns are appended as the call progresses; nothing
/// is ever removed, the bound applies only to the window sent to the model.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Creates a history seeded with the persona prompt.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(persona)],
        }
    }

    pub fn push_caller(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::caller(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    /// Total number of turns, including the persona prompt.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the persona turn is always present
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The bounded slice of the conversation sent to the chat model: the
    /// persona prompt followed by at most `limit` of the most recent turns.
    ///
    /// Recomputed on every call; older turns stay in the full history but
    /// are never transmitted again once they fall outside the window.
    pub fn context_window(&self, limit: usize) -> Vec<Turn> {
        let tail = &self.turns[1..];
        let start = tail.len().saturating_sub(limit);

        let mut window = Vec::with_capacity(1 + tail.len() - start);
        window.push(self.turns[0].clone());
        window.extend_from_slice(&tail[start..]);
        window
    }
}
