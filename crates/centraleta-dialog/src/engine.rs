//! The call-turn state machine.
//!
//! One webhook request is one turn. A request without a caller utterance
//! opens the call (greeting); a request with one continues it (translate,
//! synthesize, reply). Every failure is absorbed here and converted into a
//! scripted utterance, so a turn always produces a playable response and the
//! transport layer never sees a fault.

use crate::error::TurnError;
use crate::session::SessionStore;
use async_trait::async_trait;
use centraleta_types::Turn;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Produces the assistant's next utterance from a bounded conversation
/// window via a remote chat-completion call.
///
/// The window's first turn must be the system persona prompt.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, window: &[Turn]) -> Result<String, TurnError>;
}

/// Renders assistant text to a playable audio asset and returns its public
/// URL.
///
/// `request_base` is the scheme-and-host of the inbound webhook request,
/// used as the asset URL base when no public base address is configured.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, request_base: Option<&str>)
        -> Result<String, TurnError>;
}

/// One inbound call-turn request.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    /// Telephony call session identifier.
    pub call_sid: String,
    /// Transcribed caller speech; absent on the call's opening turn.
    pub utterance: Option<String>,
    /// Scheme-and-host of the inbound request, e.g. `https://example.org`.
    pub request_base: Option<String>,
}

/// What the telephony layer should do with the turn's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    /// Play a synthesized audio asset.
    Audio(String),
    /// Speak literal text with the provider's built-in voice.
    Say(String),
}

/// The outcome of one call turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResponse {
    pub playback: Playback,
    /// Whether to capture the caller's next utterance.
    pub gather: bool,
    /// Endpoint the captured utterance should be resubmitted to.
    pub action: String,
}

/// Tunables for the turn engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fixed opening utterance for a new call.
    pub greeting: String,
    /// Scripted utterance played when a turn fails.
    pub apology: String,
    /// Maximum number of recent turns sent to the translator (the persona
    /// prompt is always sent on top of these).
    pub history_limit: usize,
    /// Whether the greeting goes through the synthesizer or is spoken with
    /// the provider's built-in voice.
    pub synthesize_greeting: bool,
    /// Endpoint gathered speech is resubmitted to.
    pub action: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            greeting: "Hola, sóc la Verònica, d'A S Asesores. En què puc ajudar-te?".to_string(),
            apology: "Ho sento, hi ha hagut un problema tècnic.".to_string(),
            history_limit: 6,
            synthesize_greeting: true,
            action: "/voice".to_string(),
        }
    }
}

/// Drives call turns: sequences the translator and synthesizer, maintains
/// per-call history, and absorbs failures into scripted replies.
#[derive(Clone)]
pub struct TurnEngine {
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    sessions: SessionStore,
    settings: EngineSettings,
}

impl TurnEngine {
    pub fn new(
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        sessions: SessionStore,
        settings: EngineSettings,
    ) -> Self {
        Self {
            translator,
            synthesizer,
            sessions,
            settings,
        }
    }

    /// The session store backing this engine, for eviction tasks and tests.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs one call turn. Infallible by design: every error is converted
    /// into a scripted utterance and the turn still answers.
    pub async fn handle_turn(&self, request: TurnRequest) -> TurnResponse {
        match request.utterance.as_deref().map(str::trim) {
            None | Some("") => self.opening_turn(request.request_base.as_deref()).await,
            Some(utterance) => {
                self.continuation_turn(&request.call_sid, utterance, request.request_base.as_deref())
                    .await
            }
        }
    }

    /// Opening turn: fixed greeting, then listen.
    async fn opening_turn(&self, request_base: Option<&str>) -> TurnResponse {
        info!("new call, sending greeting");
        let playback = if self.settings.synthesize_greeting {
            match self
                .synthesizer
                .synthesize(&self.settings.greeting, request_base)
                .await
            {
                Ok(url) => Playback::Audio(url),
                Err(e) => {
                    warn!(error = %e, "greeting synthesis failed, speaking it directly");
                    Playback::Say(self.settings.greeting.clone())
                }
            }
        } else {
            Playback::Say(self.settings.greeting.clone())
        };

        self.listen_with(playback)
    }

    /// Continuation turn: record the utterance, translate, synthesize,
    /// reply, then listen again.
    async fn continuation_turn(
        &self,
        call_sid: &str,
        utterance: &str,
        request_base: Option<&str>,
    ) -> TurnResponse {
        debug!(call_sid, utterance, "caller utterance received");
        let window =
            self.sessions
                .record_caller(call_sid, utterance, self.settings.history_limit);

        let reply = match self.translator.translate(&window).await {
            Ok(reply) => reply,
            Err(e) => {
                // The caller turn stays recorded; the next utterance starts
                // a fresh attempt.
                warn!(call_sid, error = %e, "turn failed, sending scripted apology");
                return self.listen_with(Playback::Say(self.settings.apology.clone()));
            }
        };

        debug!(call_sid, reply, "assistant reply");
        self.sessions.record_assistant(call_sid, &reply);

        let playback = match self.synthesizer.synthesize(&reply, request_base).await {
            Ok(url) => Playback::Audio(url),
            Err(e) => {
                // Degraded but available: the reply is spoken with the
                // provider's built-in voice instead.
                warn!(call_sid, error = %e, "synthesis failed, falling back to plain speech");
                Playback::Say(reply)
            }
        };

        self.listen_with(playback)
    }

    fn listen_with(&self, playback: Playback) -> TurnResponse {
        TurnResponse {
            playback,
            gather: true,
            action: self.settings.action.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedTranslator {
        reply: Result<String, ()>,
        calls: AtomicUsize,
        last_window: Mutex<Vec<Turn>>,
    }

    impl FixedTranslator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_window: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
                last_window: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Translator for FixedTranslator {
        async fn translate(&self, window: &[Turn]) -> Result<String, TurnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_window.lock().unwrap() = window.to_vec();
            self.reply
                .clone()
                .map_err(|_| TurnError::TranslationFailed("remote error".to_string()))
        }
    }

    struct FixedSynthesizer {
        result: Result<String, TurnError>,
        calls: AtomicUsize,
    }

    impl FixedSynthesizer {
        fn serving(url: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(url.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn unconfigured() -> Arc<Self> {
            Arc::new(Self {
                result: Err(TurnError::ConfigurationMissing("voice_id".to_string())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Synthesizer for FixedSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _request_base: Option<&str>,
        ) -> Result<String, TurnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(url) => Ok(url.clone()),
                Err(TurnError::ConfigurationMissing(what)) => {
                    Err(TurnError::ConfigurationMissing(what.clone()))
                }
                Err(_) => Err(TurnError::SynthesisFailed("remote error".to_string())),
            }
        }
    }

    fn engine(
        translator: Arc<FixedTranslator>,
        synthesizer: Arc<FixedSynthesizer>,
    ) -> TurnEngine {
        TurnEngine::new(
            translator,
            synthesizer,
            SessionStore::new("persona"),
            EngineSettings::default(),
        )
    }

    fn opening_request() -> TurnRequest {
        TurnRequest {
            call_sid: "CA1".to_string(),
            utterance: None,
            request_base: None,
        }
    }

    fn utterance_request(text: &str) -> TurnRequest {
        TurnRequest {
            call_sid: "CA1".to_string(),
            utterance: Some(text.to_string()),
            request_base: None,
        }
    }

    #[tokio::test]
    async fn opening_turn_plays_greeting_and_gathers() {
        let engine = engine(
            FixedTranslator::replying("unused"),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        let response = engine.handle_turn(opening_request()).await;

        assert_eq!(
            response.playback,
            Playback::Audio("https://example.org/a.mp3".to_string())
        );
        assert!(response.gather);
        assert_eq!(response.action, "/voice");
        // no session is created until the caller speaks
        assert!(engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn opening_turn_is_idempotent() {
        let engine = engine(
            FixedTranslator::replying("unused"),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        let first = engine.handle_turn(opening_request()).await;
        let second = engine.handle_turn(opening_request()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn blank_utterance_counts_as_opening() {
        let engine = engine(
            FixedTranslator::replying("unused"),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        let response = engine.handle_turn(utterance_request("   ")).await;
        assert!(response.gather);
        assert!(engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn greeting_synthesis_failure_falls_back_to_say() {
        let translator = FixedTranslator::replying("unused");
        let engine = engine(translator, FixedSynthesizer::unconfigured());

        let response = engine.handle_turn(opening_request()).await;

        match response.playback {
            Playback::Say(text) => assert!(text.contains("Verònica")),
            other => panic!("expected Say, got {other:?}"),
        }
        assert!(response.gather);
    }

    #[tokio::test]
    async fn unsynthesized_greeting_is_spoken_directly() {
        let synthesizer = FixedSynthesizer::serving("https://example.org/a.mp3");
        let engine = TurnEngine::new(
            FixedTranslator::replying("unused"),
            synthesizer.clone(),
            SessionStore::new("persona"),
            EngineSettings {
                synthesize_greeting: false,
                ..EngineSettings::default()
            },
        );

        let response = engine.handle_turn(opening_request()).await;

        assert!(matches!(response.playback, Playback::Say(_)));
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_turn_appends_two_turns() {
        let translator = FixedTranslator::replying("Adeu, que vagi bé!");
        let engine = engine(
            translator.clone(),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        let response = engine
            .handle_turn(utterance_request("Gràcies, això és tot"))
            .await;

        assert_eq!(
            response.playback,
            Playback::Audio("https://example.org/a.mp3".to_string())
        );
        // persona + caller + assistant
        assert_eq!(engine.sessions().history_len("CA1"), Some(3));

        let window = translator.last_window.lock().unwrap().clone();
        assert_eq!(window.last().unwrap().text, "Gràcies, això és tot");

        let turns = engine.sessions().history_turns("CA1").unwrap();
        assert_eq!(turns.last().unwrap().text, "Adeu, que vagi bé!");
    }

    #[tokio::test]
    async fn translation_failure_keeps_caller_turn_and_apologizes() {
        let engine = engine(
            FixedTranslator::failing(),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        let response = engine.handle_turn(utterance_request("hola")).await;

        match response.playback {
            Playback::Say(text) => assert!(text.contains("Ho sento")),
            other => panic!("expected Say, got {other:?}"),
        }
        // the turn still listens for the caller's next utterance
        assert!(response.gather);
        // persona + caller only
        assert_eq!(engine.sessions().history_len("CA1"), Some(2));
    }

    #[tokio::test]
    async fn synthesis_failure_speaks_the_raw_reply() {
        let engine = engine(
            FixedTranslator::replying("Bon dia!"),
            FixedSynthesizer::unconfigured(),
        );

        let response = engine.handle_turn(utterance_request("hola")).await;

        assert_eq!(response.playback, Playback::Say("Bon dia!".to_string()));
        // the reply was still recorded
        assert_eq!(engine.sessions().history_len("CA1"), Some(3));
    }

    #[tokio::test]
    async fn window_is_bounded_over_a_long_call() {
        let translator = FixedTranslator::replying("resposta");
        let engine = engine(
            translator.clone(),
            FixedSynthesizer::serving("https://example.org/a.mp3"),
        );

        for i in 0..20 {
            engine
                .handle_turn(utterance_request(&format!("pregunta {i}")))
                .await;
        }

        let window = translator.last_window.lock().unwrap().clone();
        assert_eq!(window.len(), 7);
        assert_eq!(window[0].text, "persona");
        // full history keeps everything
        assert_eq!(engine.sessions().history_len("CA1"), Some(41));
    }
}
