//! Conversation message types.
//!
//! A phone conversation is an ordered sequence of [`Turn`]s. The first turn
//! is always the system persona prompt; caller and assistant turns alternate
//! after it.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The fixed persona prompt set at session creation.
    System,
    /// Transcribed caller speech.
    Caller,
    /// A reply produced by the chat model.
    Assistant,
}

impl Role {
    /// The role name used on the wire by chat-completion APIs.
    ///
    /// Callers map to `"user"`; the other roles keep their own names.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Caller => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn caller(text: impl Into<String>) -> Self {
        Self {
            role: Role::Caller,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_maps_to_user_on_the_wire() {
        assert_eq!(Role::Caller.as_wire_str(), "user");
        assert_eq!(Role::System.as_wire_str(), "system");
        assert_eq!(Role::Assistant.as_wire_str(), "assistant");
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
