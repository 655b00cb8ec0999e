//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chat-completion provider settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Speech-synthesis provider settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Audio asset storage settings.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Assistant persona and dialogue settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "centraleta_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Chat-completion provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// API key. Empty means unconfigured; translation turns will fail with
    /// a scripted apology until it is set.
    #[serde(default)]
    pub api_key: String,

    /// Endpoint base URL. Empty selects the provider's public endpoint.
    #[serde(default)]
    pub api_base: String,

    /// Model selector sent with every translation request.
    #[serde(default = "default_chat_model")]
    pub model: String,
}

/// Speech-synthesis provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// API key. Empty means unconfigured; replies fall back to the
    /// telephony provider's built-in voice.
    #[serde(default)]
    pub api_key: String,

    /// Provider voice identity.
    #[serde(default)]
    pub voice_id: String,

    /// Endpoint base URL. Empty selects the provider's public endpoint.
    #[serde(default)]
    pub api_base: String,

    /// Voice stability, 0.0–1.0.
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// Similarity boost, 0.0–1.0.
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    /// Whether the opening greeting is synthesized or spoken with the
    /// telephony provider's built-in voice.
    #[serde(default = "default_true")]
    pub synthesize_greeting: bool,
}

/// Audio asset storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Directory synthesized audio is written to and served from.
    #[serde(default = "default_assets_dir")]
    pub dir: String,

    /// Externally reachable base URL assets are served from. Empty falls
    /// back to each inbound request's own host.
    #[serde(default)]
    pub public_base_url: String,

    /// Assets older than this are deleted by the sweep task.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Interval between sweep runs. Zero disables the task.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Assistant persona and dialogue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// System persona prompt every call session starts from.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Fixed opening utterance for a new call.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Scripted utterance played when a turn fails.
    #[serde(default = "default_apology")]
    pub apology: String,

    /// Locale tag for speech capture and built-in speech.
    #[serde(default = "default_language")]
    pub language: String,

    /// Seconds the telephony provider waits for caller speech per turn.
    #[serde(default = "default_gather_timeout_secs")]
    pub gather_timeout_secs: u64,

    /// Maximum number of recent turns sent to the chat model (the persona
    /// prompt is always sent on top).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Call sessions idle longer than this are evicted. Zero disables
    /// eviction.
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_stability() -> f32 {
    0.4
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_true() -> bool {
    true
}

fn default_assets_dir() -> String {
    "public".to_string()
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    1800
}

fn default_persona() -> String {
    "Ets la Verònica, secretària virtual d'A S Asesores. Atens trucades amb calidesa, \
     professionalitat i coneixement sobre serveis d'intel·ligència artificial per negocis. \
     Parla de manera clara, natural, propera i en el mateix idioma del client. Fes una \
     pregunta a la vegada. Quan el client digui \"això és tot\" o \"gràcies\", acomiada't \
     amb amabilitat."
        .to_string()
}

fn default_greeting() -> String {
    "Hola, sóc la Verònica, d'A S Asesores. En què puc ajudar-te?".to_string()
}

fn default_apology() -> String {
    "Ho sento, hi ha hagut un problema tècnic.".to_string()
}

fn default_language() -> String {
    "ca-ES".to_string()
}

fn default_gather_timeout_secs() -> u64 {
    10
}

fn default_history_limit() -> usize {
    6
}

fn default_session_idle_timeout_secs() -> u64 {
    15 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: String::new(),
            model: default_chat_model(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: String::new(),
            api_base: String::new(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            synthesize_greeting: true,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            public_base_url: String::new(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            greeting: default_greeting(),
            apology: default_apology(),
            language: default_language(),
            gather_timeout_secs: default_gather_timeout_secs(),
            history_limit: default_history_limit(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CENTRALETA_HOST` overrides `server.host`
/// - `CENTRALETA_PORT` overrides `server.port`
/// - `CENTRALETA_LOG_LEVEL` overrides `logging.level`
/// - `CENTRALETA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` overrides `chat.api_key`
/// - `OPENAI_MODEL` overrides `chat.model`
/// - `ELEVENLABS_API_KEY` overrides `speech.api_key`
/// - `VOICE_ID` overrides `speech.voice_id`
/// - `CENTRALETA_ASSETS_DIR` overrides `assets.dir`
/// - `CENTRALETA_PUBLIC_BASE_URL` overrides `assets.public_base_url`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("CENTRALETA_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("CENTRALETA_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("CENTRALETA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("CENTRALETA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config.chat.api_key = key;
    }
    if let Ok(model) = std::env::var("OPENAI_MODEL") {
        config.chat.model = model;
    }
    if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
        config.speech.api_key = key;
    }
    if let Ok(voice) = std::env::var("VOICE_ID") {
        config.speech.voice_id = voice;
    }
    if let Ok(dir) = std::env::var("CENTRALETA_ASSETS_DIR") {
        config.assets.dir = dir;
    }
    if let Ok(base) = std::env::var("CENTRALETA_PUBLIC_BASE_URL") {
        config.assets.public_base_url = base;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.assistant.language, "ca-ES");
        assert_eq!(config.assistant.gather_timeout_secs, 10);
        assert_eq!(config.assistant.history_limit, 6);
        assert_eq!(config.assets.retention_secs, 3600);
        assert_eq!(config.assets.sweep_interval_secs, 1800);
        assert_eq!(config.chat.model, "gpt-4o");
        assert!(config.speech.synthesize_greeting);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/definitely/not/a/real/path.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[assistant]\nlanguage = \"es-ES\"\n\n[assets]\nretention_secs = 60"
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.assistant.language, "es-ES");
        assert_eq!(config.assets.retention_secs, 60);
        // untouched sections keep their defaults
        assert_eq!(config.assistant.gather_timeout_secs, 10);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[").unwrap();

        let result = load_config(file.path().to_str());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
