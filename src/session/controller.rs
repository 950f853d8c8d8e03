//! Turn-taking controller
//!
//! One task owns the question board, answer buffer, watchdog and timer.
//! Engine callbacks, timers and handle commands only deliver events; every
//! decision happens in [`Controller::handle`]. Scheduled events carry the
//! turn (or watchdog generation) they were scheduled for, so anything that
//! arrives after the session moved on is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::board::{AnswerBuffer, QuestionBoard};
use super::state::{EndReason, Phase, SessionSnapshot};
use super::timer::SessionTimer;
use super::watchdog::SilenceWatchdog;
use crate::config::SessionConfig;
use crate::questions::{NO_RESUME_PLACEHOLDER, QuestionSource, ResumeAnalysis, fallback_analysis};
use crate::voice::{ListenerEvent, ListenerMessage, ListeningHandle, VoiceAdapter};

/// Invoked once when a session ends on its own or by request
pub type EndCallback = Box<dyn FnOnce(EndReason) + Send>;

/// Everything the controller reacts to
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    QuestionsLoaded(ResumeAnalysis),
    FirstQuestionDue { turn: u64 },
    SpeechFinished { turn: u64 },
    RestartListening { turn: u64 },
    SilenceExpired { generation: u64 },
    SessionTimerExpired,
    PacingElapsed { turn: u64 },
    SettleElapsed { turn: u64 },
    StuckCheck { epoch: u64 },
    ManualStart,
    Advance,
    End,
    Shutdown,
}

pub(crate) struct Controller {
    id: Uuid,
    config: SessionConfig,
    voice: Arc<VoiceAdapter>,
    source: Arc<dyn QuestionSource>,
    events: mpsc::UnboundedSender<ControllerEvent>,
    listener: mpsc::UnboundedSender<ListenerMessage>,
    snapshot: watch::Sender<SessionSnapshot>,
    board: QuestionBoard,
    answer: AnswerBuffer,
    candidate_name: Option<String>,
    phase: Phase,
    /// Bumped on every phase change; stuck checks for older epochs are stale
    phase_epoch: u64,
    /// Bumped whenever a turn starts or is abandoned
    turn: u64,
    listening: Option<ListeningHandle>,
    stuck: bool,
    end_reason: Option<EndReason>,
    watchdog: SilenceWatchdog,
    timer: SessionTimer,
    speech: Option<JoinHandle<()>>,
    loader: Option<JoinHandle<()>>,
    scheduled: Vec<JoinHandle<()>>,
    on_end: Option<EndCallback>,
}

pub(crate) struct ControllerParts {
    pub id: Uuid,
    pub config: SessionConfig,
    pub voice: Arc<VoiceAdapter>,
    pub source: Arc<dyn QuestionSource>,
    pub events: mpsc::UnboundedSender<ControllerEvent>,
    pub listener: mpsc::UnboundedSender<ListenerMessage>,
    pub snapshot: watch::Sender<SessionSnapshot>,
    pub watchdog: SilenceWatchdog,
    pub timer: SessionTimer,
    pub on_end: Option<EndCallback>,
}

impl Controller {
    pub(crate) fn new(parts: ControllerParts) -> Self {
        Self {
            id: parts.id,
            config: parts.config,
            voice: parts.voice,
            source: parts.source,
            events: parts.events,
            listener: parts.listener,
            snapshot: parts.snapshot,
            board: QuestionBoard::default(),
            answer: AnswerBuffer::default(),
            candidate_name: None,
            phase: Phase::Idle,
            phase_epoch: 0,
            turn: 0,
            listening: None,
            stuck: false,
            end_reason: None,
            watchdog: parts.watchdog,
            timer: parts.timer,
            speech: None,
            loader: None,
            scheduled: Vec::new(),
            on_end: parts.on_end,
        }
    }

    /// Drive the session until it ends or is shut down
    pub(crate) async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ControllerEvent>,
        mut listener: mpsc::UnboundedReceiver<ListenerMessage>,
        resume_text: Option<String>,
    ) -> Option<EndReason> {
        self.begin(resume_text);
        self.publish();

        while self.phase != Phase::Ended {
            tokio::select! {
                Some(event) = events.recv() => self.handle(event),
                Some(message) = listener.recv() => self.on_listener(message),
                else => break,
            }
            self.publish();
        }

        self.teardown();
        self.publish();
        self.end_reason
    }

    fn begin(&mut self, resume_text: Option<String>) {
        tracing::info!("interview session starting");

        let events = self.events.clone();
        self.timer.start(move || {
            let _ = events.send(ControllerEvent::SessionTimerExpired);
        });

        self.set_phase(Phase::Loading);

        let resume_text = resume_text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| NO_RESUME_PLACEHOLDER.to_string());
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let question_count = self.config.question_count;

        self.loader = Some(tokio::spawn(async move {
            let generation = tokio::spawn({
                let resume_text = resume_text.clone();
                async move { source.generate(&resume_text).await }
            });

            let analysis = match generation.await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!(error = %e, "question source failed, using fallback questions");
                    fallback_analysis(&resume_text, question_count)
                }
            };
            let _ = events.send(ControllerEvent::QuestionsLoaded(analysis));
        }));
    }

    pub(crate) fn handle(&mut self, event: ControllerEvent) {
        tracing::trace!(?event, phase = ?self.phase, "controller event");

        match event {
            ControllerEvent::QuestionsLoaded(analysis) => self.on_questions_loaded(analysis),
            ControllerEvent::FirstQuestionDue { turn } => {
                if turn == self.turn && self.phase == Phase::Idle {
                    self.ask_current();
                }
            }
            ControllerEvent::SpeechFinished { turn } => {
                if turn == self.turn && self.phase == Phase::Speaking {
                    self.speech = None;
                    self.begin_listening();
                }
            }
            ControllerEvent::RestartListening { turn } => {
                if turn == self.turn && self.phase == Phase::Listening && self.listening.is_none() {
                    tracing::debug!("restarting recognition");
                    self.start_recognition();
                    if !self.watchdog.is_armed() {
                        self.arm_watchdog();
                    }
                }
            }
            ControllerEvent::SilenceExpired { generation } => {
                if self.watchdog.is_current(generation) {
                    tracing::info!(question = self.board.current_index(), "silence timeout, advancing");
                    self.advance();
                }
            }
            ControllerEvent::SessionTimerExpired => self.finish(EndReason::TimeUp),
            ControllerEvent::PacingElapsed { turn } => {
                if turn == self.turn && self.phase == Phase::Transitioning {
                    self.ask_current();
                }
            }
            ControllerEvent::SettleElapsed { turn } => {
                if turn == self.turn && self.phase == Phase::Transitioning {
                    self.finish(EndReason::Completed);
                }
            }
            ControllerEvent::StuckCheck { epoch } => {
                if epoch == self.phase_epoch
                    && matches!(self.phase, Phase::Idle | Phase::Transitioning)
                    && !self.board.is_empty()
                {
                    tracing::warn!(phase = ?self.phase, "session idle, offering manual start");
                    self.stuck = true;
                }
            }
            ControllerEvent::ManualStart => {
                if self.board.is_empty()
                    || matches!(self.phase, Phase::Loading | Phase::Transitioning | Phase::Ended)
                {
                    tracing::debug!(phase = ?self.phase, "manual start ignored");
                } else {
                    tracing::info!(question = self.board.current_index(), "manual start");
                    self.ask_current();
                }
            }
            ControllerEvent::Advance => self.advance(),
            ControllerEvent::End => self.finish(EndReason::EndedByUser),
            ControllerEvent::Shutdown => {
                tracing::info!("interview session shut down");
                self.teardown();
                self.set_phase(Phase::Ended);
            }
        }
    }

    fn on_questions_loaded(&mut self, analysis: ResumeAnalysis) {
        self.loader = None;
        if self.phase != Phase::Loading {
            return;
        }

        let analysis = if analysis.questions.is_empty() {
            tracing::warn!("question source returned nothing, using fallback questions");
            fallback_analysis(NO_RESUME_PLACEHOLDER, self.config.question_count)
        } else {
            analysis
        };

        tracing::info!(
            count = analysis.questions.len(),
            candidate = %analysis.candidate_name,
            "questions loaded"
        );

        self.candidate_name = Some(analysis.candidate_name);
        self.board = QuestionBoard::new(analysis.questions);
        self.set_phase(Phase::Idle);

        let turn = self.turn;
        self.schedule(self.config.first_question_delay, ControllerEvent::FirstQuestionDue { turn });
    }

    /// Speak the current question with a clean answer buffer
    fn ask_current(&mut self) {
        let Some(question) = self.board.current() else {
            return;
        };
        let text = question.text.clone();

        self.turn += 1;
        self.stop_recognition();
        self.watchdog.disarm();
        self.answer.clear();
        if let Some(speech) = self.speech.take() {
            speech.abort();
        }

        tracing::debug!(question = self.board.current_index(), turn = self.turn, "asking question");
        self.set_phase(Phase::Speaking);

        let turn = self.turn;
        let voice = Arc::clone(&self.voice);
        let events = self.events.clone();
        self.speech = Some(tokio::spawn(async move {
            voice.speak(&text).await;
            let _ = events.send(ControllerEvent::SpeechFinished { turn });
        }));
    }

    fn begin_listening(&mut self) {
        self.start_recognition();
        if self.listening.is_none() {
            tracing::warn!("recognition unavailable, listening in degraded mode");
        }
        self.set_phase(Phase::Listening);
        self.arm_watchdog();
    }

    fn start_recognition(&mut self) {
        self.listening = self.voice.start_listening(self.listener.clone());
    }

    fn stop_recognition(&mut self) {
        self.listening = None;
        self.voice.stop_all_listening();
    }

    fn on_listener(&mut self, message: ListenerMessage) {
        if self.listening != Some(message.handle) {
            tracing::trace!(session = message.handle.id(), "stale listener event");
            return;
        }

        match message.event {
            ListenerEvent::Fragment(fragment) => {
                if self.phase != Phase::Listening {
                    return;
                }

                self.watchdog.disarm();
                if fragment.is_final {
                    tracing::debug!(chars = fragment.text.len(), "final transcript");
                    self.answer.push_final(&fragment.text);
                    self.arm_watchdog();
                } else {
                    self.answer.set_interim(&fragment.text);
                }
            }
            ListenerEvent::Ended => {
                self.listening = None;
                if self.phase == Phase::Listening {
                    tracing::debug!("recognition ended on its own");
                    let turn = self.turn;
                    self.schedule(self.config.restart_delay, ControllerEvent::RestartListening { turn });
                }
            }
        }
    }

    fn arm_watchdog(&mut self) {
        let events = self.events.clone();
        self.watchdog.arm(self.config.silence_timeout, move |generation| {
            let _ = events.send(ControllerEvent::SilenceExpired { generation });
        });
    }

    /// Leave the current question; no-op while a transition is in flight
    fn advance(&mut self) {
        if self.board.is_empty()
            || matches!(self.phase, Phase::Loading | Phase::Transitioning | Phase::Ended)
        {
            tracing::debug!(phase = ?self.phase, "advance ignored");
            return;
        }

        self.turn += 1;
        self.set_phase(Phase::Transitioning);
        self.stop_recognition();
        self.watchdog.disarm();
        self.voice.stop_speaking();
        if let Some(speech) = self.speech.take() {
            speech.abort();
        }

        let turn = self.turn;
        if self.board.is_last() {
            tracing::info!("last question answered, wrapping up");
            self.schedule(self.config.settle_delay, ControllerEvent::SettleElapsed { turn });
            return;
        }

        self.board.advance();
        self.answer.clear();
        tracing::info!(question = self.board.current_index(), "moving to next question");
        self.schedule(self.config.pacing_delay, ControllerEvent::PacingElapsed { turn });
    }

    fn finish(&mut self, reason: EndReason) {
        if self.phase == Phase::Ended {
            return;
        }

        self.teardown();
        self.end_reason = Some(reason);
        self.set_phase(Phase::Ended);
        tracing::info!(?reason, "interview session ended");

        if let Some(on_end) = self.on_end.take() {
            on_end(reason);
        }
    }

    /// Cancel speech, recognition and every timer; idempotent
    fn teardown(&mut self) {
        self.turn += 1;
        self.voice.stop_speaking();
        self.stop_recognition();
        self.watchdog.disarm();
        self.timer.stop();

        for task in self
            .speech
            .take()
            .into_iter()
            .chain(self.loader.take())
            .chain(self.scheduled.drain(..))
        {
            task.abort();
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "phase change");
        }
        self.phase = phase;
        self.phase_epoch += 1;

        if matches!(phase, Phase::Speaking | Phase::Listening | Phase::Ended) {
            self.stuck = false;
        } else if matches!(phase, Phase::Idle | Phase::Transitioning) && !self.board.is_empty() {
            let epoch = self.phase_epoch;
            self.schedule(self.config.stuck_grace, ControllerEvent::StuckCheck { epoch });
        }
    }

    fn schedule(&mut self, delay: Duration, event: ControllerEvent) {
        self.scheduled.retain(|task| !task.is_finished());

        let events = self.events.clone();
        self.scheduled.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        }));
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            questions: self.board.questions().to_vec(),
            current_index: self.board.current_index(),
            answer: self.answer.text().to_string(),
            interim: self.answer.interim().to_string(),
            candidate_name: self.candidate_name.clone(),
            recognition_supported: self.voice.recognition_supported(),
            stuck: self.stuck,
            end_reason: self.end_reason,
        };

        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
