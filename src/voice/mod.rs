//! Voice I/O
//!
//! Speech engines are opaque capability providers; [`VoiceAdapter`] wraps
//! them behind "speak to completion" and "start/stop listening".

mod adapter;
pub mod console;
mod recognition;
mod synthesis;

pub use adapter::VoiceAdapter;
pub use console::{ConsoleRecognizer, ConsoleSynthesizer};
pub use recognition::{
    ListenerEvent, ListenerMessage, ListeningHandle, RecognitionOptions, RecognitionResult,
    RecognitionSession, RecognitionSink, SpeechRecognizer, TranscriptFragment, collapse_results,
};
pub use synthesis::{SpeechSynthesizer, Utterance, UtteranceEvent, Voice, select_voice};
