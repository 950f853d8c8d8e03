//! Terminal voice engines
//!
//! Speech is printed to stdout and held for its estimated reading time;
//! answers typed on stdin arrive as final recognition results.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::recognition::{
    RecognitionOptions, RecognitionResult, RecognitionSession, RecognitionSink, SpeechRecognizer,
};
use super::synthesis::{SpeechSynthesizer, Utterance, UtteranceEvent, Voice};
use crate::{Error, Result};

/// Default reading pace
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 170;

/// Prints utterances and waits as long as reading them aloud would take
pub struct ConsoleSynthesizer {
    words_per_minute: u32,
    cancel: watch::Sender<u64>,
}

impl ConsoleSynthesizer {
    #[must_use]
    pub fn new(words_per_minute: u32) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            words_per_minute: words_per_minute.max(1),
            cancel,
        }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_MINUTE)
    }
}

/// Time needed to speak `text` at `words_per_minute`
#[must_use]
pub fn reading_time(text: &str, words_per_minute: u32) -> Duration {
    let words = u64::try_from(text.split_whitespace().count()).unwrap_or(u64::MAX);
    Duration::from_millis(words.saturating_mul(60_000) / u64::from(words_per_minute.max(1)))
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Console Natural", "en-US")]
    }

    async fn voices_changed(&self) {
        std::future::pending::<()>().await;
    }

    fn speak(
        &self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<UtteranceEvent>,
    ) -> Result<()> {
        let mut cancelled = self.cancel.subscribe();
        let duration = reading_time(&utterance.text, self.words_per_minute);

        println!("\n  Interviewer: {}\n", utterance.text);
        let _ = events.send(UtteranceEvent::Started);

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(duration) => {
                    let _ = events.send(UtteranceEvent::Ended);
                }
                _ = cancelled.changed() => {
                    let _ = events.send(UtteranceEvent::Failed("interrupted".to_string()));
                }
            }
        });

        Ok(())
    }

    fn cancel(&self) {
        self.cancel.send_modify(|e| *e += 1);
    }
}

/// Turns typed lines into final recognition results
#[derive(Clone, Default)]
pub struct ConsoleRecognizer {
    active: Arc<Mutex<Option<RecognitionSink>>>,
}

impl ConsoleRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a typed answer; returns false when nobody is listening
    pub fn deliver_line(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        let active = self.lock_active();
        match active.as_ref() {
            Some(sink) => {
                sink.results(0, &[RecognitionResult::final_result(line)]);
                true
            }
            None => {
                tracing::debug!("not listening, typed answer dropped");
                false
            }
        }
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<RecognitionSink>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(
        &self,
        options: &RecognitionOptions,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionSession>> {
        tracing::debug!(
            session = sink.handle().id(),
            language = %options.language,
            "console recognition started"
        );
        *self.lock_active() = Some(sink.clone());

        Ok(Box::new(ConsoleSession {
            recognizer: self.clone(),
            sink,
        }))
    }
}

struct ConsoleSession {
    recognizer: ConsoleRecognizer,
    sink: RecognitionSink,
}

impl RecognitionSession for ConsoleSession {
    fn stop(&mut self) -> Result<()> {
        {
            let mut active = self.recognizer.lock_active();
            if !active
                .as_ref()
                .is_some_and(|s| s.handle() == self.sink.handle())
            {
                return Err(Error::Recognition("session already stopped".to_string()));
            }
            *active = None;
        }

        self.sink.ended();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::recognition::{ListenerEvent, ListeningHandle};

    #[test]
    fn reading_time_scales_with_words() {
        assert_eq!(reading_time("", 170), Duration::ZERO);
        assert_eq!(reading_time("one two three", 60), Duration::from_secs(3));
        assert_eq!(reading_time("word", 0), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn synthesizer_reports_start_then_end() {
        let synth = ConsoleSynthesizer::new(60);
        let (tx, mut rx) = mpsc::unbounded_channel();

        synth.speak(Utterance::new("two words", None), tx).unwrap();

        assert_eq!(rx.recv().await, Some(UtteranceEvent::Started));
        assert_eq!(rx.recv().await, Some(UtteranceEvent::Ended));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_utterance() {
        let synth = ConsoleSynthesizer::new(60);
        let (tx, mut rx) = mpsc::unbounded_channel();

        synth.speak(Utterance::new("a much longer utterance", None), tx).unwrap();
        assert_eq!(rx.recv().await, Some(UtteranceEvent::Started));

        synth.cancel();
        assert!(matches!(rx.recv().await, Some(UtteranceEvent::Failed(_))));
    }

    #[tokio::test]
    async fn typed_lines_reach_active_session_only() {
        let recognizer = ConsoleRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(!recognizer.deliver_line("nobody listening"));

        let options = RecognitionOptions::continuous("en-US");
        let mut session = recognizer
            .start(&options, RecognitionSink::new(ListeningHandle::new(1), tx))
            .unwrap();

        assert!(!recognizer.deliver_line("   "));
        assert!(recognizer.deliver_line(" I built a compiler "));

        let msg = rx.recv().await.unwrap();
        match msg.event {
            ListenerEvent::Fragment(fragment) => {
                assert_eq!(fragment.text, "I built a compiler");
                assert!(fragment.is_final);
            }
            ListenerEvent::Ended => panic!("expected fragment"),
        }

        session.stop().unwrap();
        assert_eq!(rx.recv().await.unwrap().event, ListenerEvent::Ended);
        assert!(session.stop().is_err());
        assert!(!recognizer.deliver_line("too late"));
    }
}
