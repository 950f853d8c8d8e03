//! Speech recognition engine contract
//!
//! Engines push raw result batches into a [`RecognitionSink`]; the sink
//! collapses each batch into one transcript fragment and tags it with the
//! listening session it belongs to.

use tokio::sync::mpsc;

use crate::Result;

/// Recognition settings handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// Language tag (e.g. "en-US")
    pub language: String,
    /// Keep recognising across pauses
    pub continuous: bool,
    /// Report provisional results
    pub interim_results: bool,
}

impl RecognitionOptions {
    /// Continuous recognition with interim results
    #[must_use]
    pub fn continuous(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// One raw result as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    #[must_use]
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    #[must_use]
    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Recognised speech delivered to the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub text: String,
    /// Final fragments will not be revised by the engine
    pub is_final: bool,
}

/// Identifies one listening session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListeningHandle(u64);

impl ListeningHandle {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric session id
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Event emitted while listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// A recognised fragment
    Fragment(TranscriptFragment),
    /// The engine stopped, on request or on its own
    Ended,
}

/// A listener event tagged with its session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerMessage {
    pub handle: ListeningHandle,
    pub event: ListenerEvent,
}

/// Where an engine reports results for one session
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    handle: ListeningHandle,
    tx: mpsc::UnboundedSender<ListenerMessage>,
}

impl RecognitionSink {
    pub(crate) const fn new(
        handle: ListeningHandle,
        tx: mpsc::UnboundedSender<ListenerMessage>,
    ) -> Self {
        Self { handle, tx }
    }

    /// Session this sink reports for
    #[must_use]
    pub const fn handle(&self) -> ListeningHandle {
        self.handle
    }

    /// Report a result batch; results before `result_index` were already reported
    pub fn results(&self, result_index: usize, results: &[RecognitionResult]) {
        if let Some(fragment) = collapse_results(result_index, results) {
            self.send(ListenerEvent::Fragment(fragment));
        }
    }

    /// Report that the engine stopped
    pub fn ended(&self) {
        self.send(ListenerEvent::Ended);
    }

    /// Report an engine error; errors are logged, never propagated
    pub fn error(&self, message: &str) {
        tracing::warn!(session = self.handle.id(), error = message, "speech recognition error");
    }

    fn send(&self, event: ListenerEvent) {
        if self
            .tx
            .send(ListenerMessage {
                handle: self.handle,
                event,
            })
            .is_err()
        {
            tracing::trace!(session = self.handle.id(), "listener gone, dropping event");
        }
    }
}

/// Platform speech recognition capability
pub trait SpeechRecognizer: Send + Sync {
    /// Begin recognition, reporting into `sink` until stopped
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot start (permissions, already running)
    fn start(
        &self,
        options: &RecognitionOptions,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionSession>>;
}

/// A running recognition session
pub trait RecognitionSession: Send {
    /// Stop recognising
    ///
    /// # Errors
    ///
    /// Returns error if the engine is already stopped or in an invalid state
    fn stop(&mut self) -> Result<()>;
}

/// Collapse a result batch into one fragment
///
/// Final transcripts from `result_index` onward are concatenated and win
/// over interim ones; a batch with neither yields nothing.
#[must_use]
pub fn collapse_results(result_index: usize, results: &[RecognitionResult]) -> Option<TranscriptFragment> {
    let mut final_text = String::new();
    let mut interim_text = String::new();

    for result in results.iter().skip(result_index) {
        if result.is_final {
            final_text.push_str(&result.transcript);
        } else {
            interim_text.push_str(&result.transcript);
        }
    }

    if !final_text.is_empty() {
        Some(TranscriptFragment {
            text: final_text,
            is_final: true,
        })
    } else if !interim_text.is_empty() {
        Some(TranscriptFragment {
            text: interim_text,
            is_final: false,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finals_win_over_interims() {
        let results = vec![
            RecognitionResult::final_result("hello "),
            RecognitionResult::interim("wor"),
            RecognitionResult::final_result("there"),
        ];

        let fragment = collapse_results(0, &results).unwrap();
        assert_eq!(fragment.text, "hello there");
        assert!(fragment.is_final);
    }

    #[test]
    fn interims_concatenate_without_finals() {
        let results = vec![
            RecognitionResult::final_result("already sent"),
            RecognitionResult::interim("how "),
            RecognitionResult::interim("are"),
        ];

        let fragment = collapse_results(1, &results).unwrap();
        assert_eq!(fragment.text, "how are");
        assert!(!fragment.is_final);
    }

    #[test]
    fn empty_batch_yields_nothing() {
        assert!(collapse_results(0, &[]).is_none());
        assert!(collapse_results(2, &[RecognitionResult::interim("x")]).is_none());
        assert!(collapse_results(0, &[RecognitionResult::interim("")]).is_none());
    }

    #[tokio::test]
    async fn sink_tags_events_with_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = RecognitionSink::new(ListeningHandle::new(7), tx);

        sink.results(0, &[RecognitionResult::interim("hel")]);
        sink.error("network");
        sink.ended();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.handle.id(), 7);
        assert_eq!(
            first.event,
            ListenerEvent::Fragment(TranscriptFragment {
                text: "hel".to_string(),
                is_final: false
            })
        );
        assert_eq!(rx.recv().await.unwrap().event, ListenerEvent::Ended);
    }
}
