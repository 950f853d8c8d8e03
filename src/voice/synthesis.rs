//! Text-to-speech engine contract and voice selection

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// A synthesis voice offered by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Display name (e.g. "Google US English")
    pub name: String,
    /// BCP 47 language tag (e.g. "en-US")
    pub lang: String,
}

impl Voice {
    /// Create a voice description
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// A single piece of text to be spoken
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    /// Utterance at normal rate, pitch and volume
    #[must_use]
    pub fn new(text: impl Into<String>, voice: Option<Voice>) -> Self {
        Self {
            text: text.into(),
            voice,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Progress reported by the engine for a queued utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio output began
    Started,
    /// Audio output finished
    Ended,
    /// Engine error, including interruption by `cancel`
    Failed(String),
}

/// Platform text-to-speech capability
///
/// Engines may report events late, out of order or never; the adapter
/// bounds every wait.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices currently loaded (may be empty while the engine warms up)
    fn voices(&self) -> Vec<Voice>;

    /// Resolves once the voice list changes
    async fn voices_changed(&self);

    /// Queue an utterance, reporting progress on `events`
    ///
    /// # Errors
    ///
    /// Returns error if the engine refuses the utterance
    fn speak(
        &self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<UtteranceEvent>,
    ) -> Result<()>;

    /// Cancel any queued or playing utterance; safe when idle
    fn cancel(&self);
}

/// Pick the voice used for an utterance
///
/// Prefers a voice whose name carries one of `markers` and whose language
/// matches the primary subtag of `language`, then any voice in that
/// language, then the first voice available.
#[must_use]
pub fn select_voice<'a>(voices: &'a [Voice], language: &str, markers: &[String]) -> Option<&'a Voice> {
    let primary = primary_subtag(language);
    let lang_matches = |v: &&Voice| primary_subtag(&v.lang).eq_ignore_ascii_case(primary);

    voices
        .iter()
        .filter(lang_matches)
        .find(|v| markers.iter().any(|m| v.name.contains(m.as_str())))
        .or_else(|| voices.iter().find(lang_matches))
        .or_else(|| voices.first())
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["Google".to_string(), "Natural".to_string(), "Premium".to_string()]
    }

    #[test]
    fn prefers_marked_voice_in_language() {
        let voices = vec![
            Voice::new("Alex", "en-US"),
            Voice::new("Google Deutsch", "de-DE"),
            Voice::new("Samantha Premium", "en-GB"),
        ];

        let picked = select_voice(&voices, "en-US", &markers()).unwrap();
        assert_eq!(picked.name, "Samantha Premium");
    }

    #[test]
    fn falls_back_to_language_match() {
        let voices = vec![Voice::new("Anna", "de-DE"), Voice::new("Alex", "en-US")];

        let picked = select_voice(&voices, "en-US", &markers()).unwrap();
        assert_eq!(picked.name, "Alex");
    }

    #[test]
    fn falls_back_to_first_voice() {
        let voices = vec![Voice::new("Anna", "de-DE"), Voice::new("Amelie", "fr-FR")];

        let picked = select_voice(&voices, "en-US", &markers()).unwrap();
        assert_eq!(picked.name, "Anna");
    }

    #[test]
    fn no_voices_selects_none() {
        assert!(select_voice(&[], "en-US", &markers()).is_none());
    }
}
