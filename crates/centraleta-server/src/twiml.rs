//! Minimal TwiML rendering for the voice webhook reply.
//!
//! Only the verbs this service emits are supported: `Play`, `Say`, and
//! `Gather` (speech input resubmitted to the turn endpoint). Telephony
//! providers are strict XML parsers, so all text and attribute values are
//! escaped.

use centraleta_dialog::{Playback, TurnResponse};

/// Rendering settings for the reply document.
#[derive(Debug, Clone)]
pub struct TwimlSettings {
    /// Locale tag for speech capture and built-in speech, e.g. `ca-ES`.
    pub language: String,
    /// Seconds the provider waits for caller speech.
    pub gather_timeout_secs: u64,
}

/// Escapes a string for use in XML text and attribute values.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders one turn outcome as a TwiML document.
pub fn render_turn(response: &TurnResponse, settings: &TwimlSettings) -> String {
    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>");

    match &response.playback {
        Playback::Audio(url) => {
            doc.push_str("<Play>");
            doc.push_str(&escape(url));
            doc.push_str("</Play>");
        }
        Playback::Say(text) => {
            doc.push_str(&format!(
                "<Say language=\"{}\" voice=\"woman\">{}</Say>",
                escape(&settings.language),
                escape(text)
            ));
        }
    }

    if response.gather {
        doc.push_str(&format!(
            "<Gather input=\"speech\" action=\"{}\" method=\"POST\" language=\"{}\" timeout=\"{}\"/>",
            escape(&response.action),
            escape(&settings.language),
            settings.gather_timeout_secs
        ));
    }

    doc.push_str("</Response>");
    doc
}
