//! AIRA - Voice-driven mock interview engine
//!
//! This library provides the core of the AIRA interviewer:
//! - Voice I/O over opaque speech synthesis and recognition engines
//! - Resume-based question generation with a static fallback
//! - A turn-taking controller with silence detection
//! - Text rendering of the running session
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Session Shell                      │
//! │   Header/Clock  │  Questions  │  Status  │  Answer  │
//! └────────────────────┬────────────────────────────────┘
//!                      │ snapshots
//! ┌────────────────────▼────────────────────────────────┐
//! │              Turn-Taking Controller                  │
//! │   Board  │  Answer Buffer  │  Watchdog  │  Timer    │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐     ┌────────────▼────────────┐
//! │   Voice Adapter     │     │    Question Source      │
//! │   speak  │  listen  │     │   LLM  │  Fallback      │
//! └─────────────────────┘     └─────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod passcode;
pub mod questions;
pub mod resume;
pub mod session;
pub mod shell;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use passcode::{GateState, PasscodeGate};
pub use questions::{
    ChatCompletionClient, CompletionBackend, QuestionGenerator, QuestionRecord, QuestionSource,
    ResumeAnalysis,
};
pub use resume::{ResumeData, ResumeFile, load_resume, resume_text};
pub use session::{EndReason, InterviewSession, Phase, SessionSnapshot, TurnPhase};
pub use voice::{SpeechRecognizer, SpeechSynthesizer, VoiceAdapter};
