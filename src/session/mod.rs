//! Interview session
//!
//! [`InterviewSession`] spawns the turn-taking controller and exposes its
//! state as watch channels plus a few manual commands. Dropping the handle
//! tears the session down without invoking the end callback.

mod board;
mod controller;
mod state;
mod timer;
mod watchdog;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

pub use board::{AnswerBuffer, QuestionBoard};
pub use controller::EndCallback;
pub use state::{EndReason, Phase, SessionSnapshot, TurnPhase};
pub use timer::SessionTimer;
pub use watchdog::SilenceWatchdog;

use controller::{Controller, ControllerEvent, ControllerParts};

use crate::config::SessionConfig;
use crate::questions::QuestionSource;
use crate::voice::VoiceAdapter;
use crate::{Error, Result};

/// Configures and starts an [`InterviewSession`]
pub struct SessionBuilder {
    config: SessionConfig,
    voice: Arc<VoiceAdapter>,
    source: Arc<dyn QuestionSource>,
    resume_text: Option<String>,
    on_end: Option<EndCallback>,
}

impl SessionBuilder {
    /// Resume text handed to the question source
    #[must_use]
    pub fn resume_text(mut self, text: impl Into<String>) -> Self {
        self.resume_text = Some(text.into());
        self
    }

    /// Called once when the session ends by itself or through [`InterviewSession::end`]
    #[must_use]
    pub fn on_end<F>(mut self, on_end: F) -> Self
    where
        F: FnOnce(EndReason) + Send + 'static,
    {
        self.on_end = Some(Box::new(on_end));
        self
    }

    /// Spawn the controller; must be called inside a tokio runtime
    #[must_use]
    pub fn start(self) -> InterviewSession {
        let id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (listener_tx, listener_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(SessionSnapshot::new(id, self.voice.recognition_supported()));

        let watchdog = SilenceWatchdog::new();
        let silence = watchdog.subscribe();
        let timer = SessionTimer::new(self.config.duration);
        let clock = timer.subscribe();

        let controller = Controller::new(ControllerParts {
            id,
            config: self.config,
            voice: self.voice,
            source: self.source,
            events: events_tx.clone(),
            listener: listener_tx,
            snapshot: snapshot_tx,
            watchdog,
            timer,
            on_end: self.on_end,
        });

        let span = tracing::info_span!("interview", session = %id);
        let task = tokio::spawn(
            controller
                .run(events_rx, listener_rx, self.resume_text)
                .instrument(span),
        );

        InterviewSession {
            id,
            commands: events_tx,
            snapshot: snapshot_rx,
            silence,
            clock,
            task: Some(task),
        }
    }
}

/// Handle to a running interview
pub struct InterviewSession {
    id: Uuid,
    commands: mpsc::UnboundedSender<ControllerEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
    silence: watch::Receiver<Option<u32>>,
    clock: watch::Receiver<u32>,
    task: Option<JoinHandle<Option<EndReason>>>,
}

impl InterviewSession {
    /// Start configuring a session
    #[must_use]
    pub fn builder(
        config: SessionConfig,
        voice: Arc<VoiceAdapter>,
        source: Arc<dyn QuestionSource>,
    ) -> SessionBuilder {
        SessionBuilder {
            config,
            voice,
            source,
            resume_text: None,
            on_end: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Latest published state
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Follow state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Follow the silence countdown; `None` while not armed
    #[must_use]
    pub fn subscribe_silence(&self) -> watch::Receiver<Option<u32>> {
        self.silence.clone()
    }

    /// Follow the seconds left in the session
    #[must_use]
    pub fn subscribe_clock(&self) -> watch::Receiver<u32> {
        self.clock.clone()
    }

    /// Move on to the next question (or wrap up after the last)
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the session already ended
    pub fn advance(&self) -> Result<()> {
        self.send(ControllerEvent::Advance)
    }

    /// Ask the current question again, e.g. when auto-play was blocked
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the session already ended
    pub fn start_current(&self) -> Result<()> {
        self.send(ControllerEvent::ManualStart)
    }

    /// End the interview now
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the session already ended
    pub fn end(&self) -> Result<()> {
        self.send(ControllerEvent::End)
    }

    /// Wait for the session to finish
    ///
    /// Returns `None` if it was shut down rather than ended.
    pub async fn wait(mut self) -> Option<EndReason> {
        let task = self.task.take()?;
        match task.await {
            Ok(reason) => reason,
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "session task failed");
                None
            }
        }
    }

    /// Tear the session down without signalling the end callback
    pub async fn shutdown(self) {
        let _ = self.commands.send(ControllerEvent::Shutdown);
        let _ = self.wait().await;
    }

    fn send(&self, event: ControllerEvent) -> Result<()> {
        self.commands.send(event).map_err(|_| Error::SessionClosed)
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        let _ = self.commands.send(ControllerEvent::Shutdown);
    }
}
