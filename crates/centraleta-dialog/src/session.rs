//! Per-call conversation sessions.
//!
//! Each ongoing phone call gets its own [`ConversationHistory`], keyed by
//! the call SID supplied by the telephony provider. Concurrent calls never
//! share dialogue state. Sessions have no explicit end-of-call event, so a
//! background task evicts those idle longer than a configured timeout.

use crate::history::ConversationHistory;
use centraleta_types::Turn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Session key used when the telephony request carries no call SID.
const FALLBACK_SID: &str = "unidentified-call";

struct Session {
    history: ConversationHistory,
    last_activity: Instant,
}

/// Call-SID-keyed store of conversation histories.
///
/// Uses `std::sync::Mutex` intentionally: all lock acquisitions are brief
/// map operations that never span `.await` points, so a synchronous lock is
/// safe and cheaper than `tokio::sync::Mutex`.
#[derive(Clone)]
pub struct SessionStore {
    persona: Arc<str>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Creates an empty store; every new session starts from `persona`.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: Arc::from(persona.into()),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn normalize_sid(call_sid: &str) -> &str {
        let sid = call_sid.trim();
        if sid.is_empty() {
            FALLBACK_SID
        } else {
            sid
        }
    }

    /// Appends a caller turn to the call's history, creating the session on
    /// first contact, and returns the bounded context window for the
    /// translation call.
    pub fn record_caller(&self, call_sid: &str, text: &str, window_limit: usize) -> Vec<Turn> {
        let sid = Self::normalize_sid(call_sid);
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        let session = sessions
            .entry(sid.to_string())
            .or_insert_with(|| Session {
                history: ConversationHistory::new(self.persona.as_ref()),
                last_activity: Instant::now(),
            });
        session.history.push_caller(text);
        session.last_activity = Instant::now();
        session.history.context_window(window_limit)
    }

    /// Appends the assistant's reply to the call's history.
    ///
    /// A no-op if the session has been evicted in the meantime; the reply is
    /// still played to the caller, it just won't be remembered.
    pub fn record_assistant(&self, call_sid: &str, text: &str) {
        let sid = Self::normalize_sid(call_sid);
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        if let Some(session) = sessions.get_mut(sid) {
            session.history.push_assistant(text);
            session.last_activity = Instant::now();
        }
    }

    /// Removes sessions idle longer than `max_idle`; returns how many were
    /// evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity.elapsed() <= max_idle);
        before - sessions.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full history length for a call, if the session exists.
    pub fn history_len(&self, call_sid: &str) -> Option<usize> {
        let sid = Self::normalize_sid(call_sid);
        self.sessions
            .lock()
            .expect("session store poisoned")
            .get(sid)
            .map(|s| s.history.len())
    }

    /// Snapshot of a call's full history, if the session exists.
    pub fn history_turns(&self, call_sid: &str) -> Option<Vec<Turn>> {
        let sid = Self::normalize_sid(call_sid);
        self.sessions
            .lock()
            .expect("session store poisoned")
            .get(sid)
            .map(|s| s.history.turns().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use centraleta_types::Role;

    #[test]
    fn first_contact_creates_a_session() {
        let store = SessionStore::new("persona");
        assert!(store.is_empty());

        let window = store.record_caller("CA123", "hola", 6);
        assert_eq!(store.len(), 1);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, Role::System);
        assert_eq!(window[1].text, "hola");
    }

    #[test]
    fn concurrent_calls_do_not_share_history() {
        let store = SessionStore::new("persona");
        store.record_caller("CA1", "first caller", 6);
        store.record_caller("CA2", "second caller", 6);

        let turns = store.history_turns("CA1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text, "first caller");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn blank_sid_maps_to_the_fallback_session() {
        let store = SessionStore::new("persona");
        store.record_caller("", "hola", 6);
        store.record_caller("   ", "una altra", 6);
        assert_eq!(store.len(), 1);
        assert_eq!(store.history_len("").unwrap(), 3);
    }

    #[test]
    fn assistant_reply_is_appended_to_the_right_call() {
        let store = SessionStore::new("persona");
        store.record_caller("CA1", "hola", 6);
        store.record_assistant("CA1", "bon dia");
        // unknown call: dropped silently
        store.record_assistant("CA9", "lost");

        let turns = store.history_turns("CA1").unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].role, Role::Assistant);
        assert!(store.history_turns("CA9").is_none());
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::new("persona");
        store.record_caller("CA1", "hola", 6);

        assert_eq!(store.evict_idle(Duration::from_secs(60)), 0);
        assert_eq!(store.len(), 1);

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.is_empty());
    }
}
