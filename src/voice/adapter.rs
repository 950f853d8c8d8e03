//! Voice I/O adapter
//!
//! Owns the current utterance and recognition session so callers never
//! touch engine handles directly. Every engine failure is logged and
//! swallowed here; callers only see "finished speaking" and listener events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::recognition::{
    ListenerMessage, ListeningHandle, RecognitionOptions, RecognitionSession, RecognitionSink,
    SpeechRecognizer,
};
use super::synthesis::{SpeechSynthesizer, Utterance, UtteranceEvent, Voice, select_voice};
use crate::config::VoiceConfig;

struct ActiveRecognition {
    handle: ListeningHandle,
    session: Box<dyn RecognitionSession>,
}

/// Wraps the platform speech engines behind speak/listen operations
pub struct VoiceAdapter {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    config: VoiceConfig,
    /// Bumped on every new utterance or cancel; waiters for older values give up
    speech_epoch: watch::Sender<u64>,
    recognition: Mutex<Option<ActiveRecognition>>,
    next_session: AtomicU64,
}

impl VoiceAdapter {
    /// Create an adapter; `recognizer` is `None` when the host cannot recognise speech
    #[must_use]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        config: VoiceConfig,
    ) -> Self {
        let (speech_epoch, _) = watch::channel(0);
        Self {
            synthesizer,
            recognizer,
            config,
            speech_epoch,
            recognition: Mutex::new(None),
            next_session: AtomicU64::new(0),
        }
    }

    /// Whether speech recognition is available on this host
    #[must_use]
    pub const fn recognition_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Speak `text`, resolving once it finished, failed, timed out or was cancelled
    ///
    /// Any utterance already playing is cancelled first.
    pub async fn speak(&self, text: &str) {
        tracing::debug!(chars = text.len(), "request to speak");

        let epoch = self.cancel_utterance();
        let voices = self.load_voices().await;

        // Let the engine settle after the cancel
        tokio::time::sleep(self.config.cancel_settle).await;
        if *self.speech_epoch.borrow() != epoch {
            tracing::debug!("utterance superseded before it started");
            return;
        }

        let voice = select_voice(
            &voices,
            &self.config.language,
            &self.config.preferred_voice_markers,
        )
        .cloned();
        tracing::debug!(voice = ?voice.as_ref().map(|v| &v.name), "selected voice");

        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = self.synthesizer.speak(Utterance::new(text, voice), tx) {
            tracing::warn!(error = %e, "speech synthesis failed");
            return;
        }

        let mut epoch_rx = self.speech_epoch.subscribe();
        tokio::select! {
            () = self.await_utterance(rx) => {}
            _ = epoch_rx.wait_for(|current| *current != epoch) => {
                tracing::debug!("utterance cancelled");
            }
        }
    }

    /// Cancel any in-flight utterance; idempotent
    pub fn stop_speaking(&self) {
        self.cancel_utterance();
    }

    /// Start listening, reporting events on `events`
    ///
    /// Any previous session is stopped first. Returns `None` when recognition
    /// is unsupported or the engine refused to start.
    pub fn start_listening(
        &self,
        events: mpsc::UnboundedSender<ListenerMessage>,
    ) -> Option<ListeningHandle> {
        let Some(recognizer) = &self.recognizer else {
            tracing::warn!("speech recognition not supported on this host");
            return None;
        };

        self.stop_all_listening();

        let handle = ListeningHandle::new(self.next_session.fetch_add(1, Ordering::Relaxed) + 1);
        let options = RecognitionOptions::continuous(self.config.language.clone());

        match recognizer.start(&options, RecognitionSink::new(handle, events)) {
            Ok(session) => {
                tracing::debug!(session = handle.id(), "recognition started");
                *self.lock_recognition() = Some(ActiveRecognition { handle, session });
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start recognition");
                None
            }
        }
    }

    /// Stop the session identified by `handle`; no-op if it is not active
    pub fn stop_listening(&self, handle: ListeningHandle) {
        let active = {
            let mut guard = self.lock_recognition();
            if guard.as_ref().is_some_and(|a| a.handle == handle) {
                guard.take()
            } else {
                None
            }
        };

        if let Some(active) = active {
            Self::stop_session(active);
        }
    }

    /// Stop whichever session is active; no-op when idle
    pub fn stop_all_listening(&self) {
        let active = self.lock_recognition().take();
        if let Some(active) = active {
            Self::stop_session(active);
        }
    }

    /// Handle of the active listening session, if any
    #[must_use]
    pub fn active_listening(&self) -> Option<ListeningHandle> {
        self.lock_recognition().as_ref().map(|a| a.handle)
    }

    fn stop_session(mut active: ActiveRecognition) {
        match active.session.stop() {
            Ok(()) => tracing::debug!(session = active.handle.id(), "recognition stopped"),
            Err(e) => tracing::debug!(
                session = active.handle.id(),
                error = %e,
                "recognition stop ignored"
            ),
        }
    }

    fn lock_recognition(&self) -> std::sync::MutexGuard<'_, Option<ActiveRecognition>> {
        self.recognition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Supersede the current utterance, returning the new epoch
    fn cancel_utterance(&self) -> u64 {
        self.synthesizer.cancel();
        let mut next = 0;
        self.speech_epoch.send_modify(|e| {
            *e += 1;
            next = *e;
        });
        next
    }

    async fn load_voices(&self) -> Vec<Voice> {
        let voices = self.synthesizer.voices();
        if !voices.is_empty() {
            return voices;
        }

        tracing::debug!("no voices loaded yet, waiting");
        if tokio::time::timeout(self.config.voice_load_timeout, self.synthesizer.voices_changed())
            .await
            .is_err()
        {
            tracing::debug!("voice load timeout");
        }

        let voices = self.synthesizer.voices();
        tracing::debug!(count = voices.len(), "voices loaded");
        voices
    }

    /// Wait for the engine to finish, bounded whether or not it reports progress
    async fn await_utterance(&self, mut rx: mpsc::UnboundedReceiver<UtteranceEvent>) {
        let mut started = false;
        let mut deadline = Instant::now() + self.config.speak_start_timeout;

        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(UtteranceEvent::Started)) => {
                    if !started {
                        tracing::debug!("speech started");
                        started = true;
                        deadline = Instant::now() + self.config.max_utterance;
                    }
                }
                Ok(Some(UtteranceEvent::Ended)) => {
                    tracing::debug!("speech ended");
                    return;
                }
                Ok(Some(UtteranceEvent::Failed(e))) => {
                    tracing::warn!(error = %e, "speech error");
                    return;
                }
                Ok(None) => {
                    tracing::debug!("speech engine dropped utterance events");
                    return;
                }
                Err(_) => {
                    tracing::warn!(started, "speech timeout - resolving anyway");
                    return;
                }
            }
        }
    }
}

impl Drop for VoiceAdapter {
    fn drop(&mut self) {
        self.stop_all_listening();
        self.synthesizer.cancel();
    }
}
