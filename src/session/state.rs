//! Observable session state

use uuid::Uuid;

use crate::questions::QuestionRecord;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not started, or questions loaded and waiting for the first turn
    #[default]
    Idle,
    /// Waiting for the question source
    Loading,
    /// Asking the current question
    Speaking,
    /// Waiting for the candidate's answer
    Listening,
    /// Moving to the next question or wrapping up
    Transitioning,
    /// Session over; nothing else will happen
    Ended,
}

/// Coarse turn phase used to gate the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Speaking,
    Listening,
    Transitioning,
}

impl Phase {
    #[must_use]
    pub const fn turn_phase(self) -> TurnPhase {
        match self {
            Self::Idle | Self::Loading | Self::Ended => TurnPhase::Idle,
            Self::Speaking => TurnPhase::Speaking,
            Self::Listening => TurnPhase::Listening,
            Self::Transitioning => TurnPhase::Transitioning,
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The last question was answered
    Completed,
    /// The session timer ran out
    TimeUp,
    /// The candidate ended the interview
    EndedByUser,
}

/// Read-only view of a session published after every event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    pub questions: Vec<QuestionRecord>,
    pub current_index: usize,
    /// Finalized answer for the current question
    pub answer: String,
    /// Provisional fragment still being recognised
    pub interim: String,
    pub candidate_name: Option<String>,
    /// Whether recognition actually runs while listening
    pub recognition_supported: bool,
    /// Show the manual "start question" affordance
    pub stuck: bool,
    pub end_reason: Option<EndReason>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(session_id: Uuid, recognition_supported: bool) -> Self {
        Self {
            session_id,
            phase: Phase::Idle,
            questions: Vec::new(),
            current_index: 0,
            answer: String::new(),
            interim: String::new(),
            candidate_name: None,
            recognition_supported,
            stuck: false,
            end_reason: None,
        }
    }

    #[must_use]
    pub const fn turn_phase(&self) -> TurnPhase {
        self.phase.turn_phase()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.questions.iter().filter(|q| q.completed).count()
    }
}
