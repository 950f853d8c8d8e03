//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use aira_interview::config::{SessionConfig, VoiceConfig};
use aira_interview::questions::{QuestionRecord, QuestionSource, ResumeAnalysis};
use aira_interview::session::{EndReason, InterviewSession, SessionSnapshot};
use aira_interview::voice::{
    RecognitionOptions, RecognitionResult, RecognitionSession, RecognitionSink, SpeechRecognizer,
    SpeechSynthesizer, Utterance, UtteranceEvent, Voice, VoiceAdapter,
};
use aira_interview::{Error, Result};

/// How the scripted synthesizer behaves for every utterance
#[derive(Clone, Copy)]
pub enum SpeechMode {
    /// Report start, then end after the given time unless cancelled
    Finish(Duration),
    /// Never report anything
    Silent,
}

/// Speech engine that records what it was asked to say
pub struct ScriptedSynth {
    mode: SpeechMode,
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    cancel: watch::Sender<u64>,
    held: Mutex<Vec<mpsc::UnboundedSender<UtteranceEvent>>>,
}

impl ScriptedSynth {
    pub fn new(mode: SpeechMode) -> Arc<Self> {
        let (cancel, _) = watch::channel(0);
        Arc::new(Self {
            mode,
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            cancel,
            held: Mutex::new(Vec::new()),
        })
    }

    /// Speaks every utterance for one second
    pub fn quick() -> Arc<Self> {
        Self::new(SpeechMode::Finish(Duration::from_secs(1)))
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynth {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Test Natural", "en-US")]
    }

    async fn voices_changed(&self) {
        std::future::pending::<()>().await;
    }

    fn speak(&self, utterance: Utterance, events: mpsc::UnboundedSender<UtteranceEvent>) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance.text);

        match self.mode {
            SpeechMode::Silent => self.held.lock().unwrap().push(events),
            SpeechMode::Finish(duration) => {
                let mut cancelled = self.cancel.subscribe();
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
            }
        }

        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancel.send_modify(|e| *e += 1);
    }
}

#[derive(Default)]
struct RecognizerState {
    active: Mutex<Option<RecognitionSink>>,
    starts: AtomicUsize,
    refuse: AtomicBool,
}

/// Recognition engine driven by the test
#[derive(Clone, Default)]
pub struct ScriptedRecognizer {
    state: Arc<RecognizerState>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that refuses to start
    pub fn refusing() -> Self {
        let recognizer = Self::default();
        recognizer.state.refuse.store(true, Ordering::SeqCst);
        recognizer
    }

    pub fn starts(&self) -> usize {
        self.state.starts.load(Ordering::SeqCst)
    }

    /// Sink of the running session, if any
    pub fn active(&self) -> Option<RecognitionSink> {
        self.state.active.lock().unwrap().clone()
    }

    pub fn say_interim(&self, text: &str) {
        if let Some(sink) = self.active() {
            sink.results(0, &[RecognitionResult::interim(text)]);
        }
    }

    pub fn say_final(&self, text: &str) {
        if let Some(sink) = self.active() {
            sink.results(0, &[RecognitionResult::final_result(text)]);
        }
    }

    /// Stop without being asked, like engines that end after each utterance
    pub fn end_spontaneously(&self) {
        let sink = self.state.active.lock().unwrap().take();
        if let Some(sink) = sink {
            sink.ended();
        }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(
        &self,
        _options: &RecognitionOptions,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionSession>> {
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(Error::Recognition("not-allowed".to_string()));
        }

        self.state.starts.fetch_add(1, Ordering::SeqCst);
        *self.state.active.lock().unwrap() = Some(sink.clone());

        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            sink,
        }))
    }
}

struct ScriptedSession {
    state: Arc<RecognizerState>,
    sink: RecognitionSink,
}

impl RecognitionSession for ScriptedSession {
    fn stop(&mut self) -> Result<()> {
        let mut active = self.state.active.lock().unwrap();
        if active.as_ref().is_some_and(|s| s.handle() == self.sink.handle()) {
            *active = None;
            drop(active);
            self.sink.ended();
            Ok(())
        } else {
            Err(Error::Recognition("invalid state".to_string()))
        }
    }
}

/// Question source with a fixed answer that records the resume text it saw
pub struct StaticSource {
    analysis: ResumeAnalysis,
    seen: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn with_questions(count: u32) -> Arc<Self> {
        let questions = (1..=count)
            .map(|id| {
                let mut q = QuestionRecord::new(id, format!("Topic {id}"), format!("Question {id}?"));
                q.is_current = id == 1;
                q
            })
            .collect();

        Arc::new(Self {
            analysis: ResumeAnalysis {
                candidate_name: "Ada".to_string(),
                skills: vec!["Rust".to_string()],
                experience: "Senior".to_string(),
                questions,
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::with_questions(0)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionSource for StaticSource {
    async fn generate(&self, resume_text: &str) -> ResumeAnalysis {
        self.seen.lock().unwrap().push(resume_text.to_string());
        self.analysis.clone()
    }
}

/// A running session with handles on every collaborator
pub struct Harness {
    pub session: InterviewSession,
    pub synth: Arc<ScriptedSynth>,
    pub recognizer: ScriptedRecognizer,
    pub source: Arc<StaticSource>,
    pub ended: Arc<Mutex<Vec<EndReason>>>,
}

impl Harness {
    pub fn start(config: SessionConfig, questions: u32) -> Self {
        Self::build(
            config,
            ScriptedSynth::quick(),
            Some(ScriptedRecognizer::new()),
            StaticSource::with_questions(questions),
            Some("Ada Lovelace\nMathematician"),
        )
    }

    pub fn build(
        config: SessionConfig,
        synth: Arc<ScriptedSynth>,
        recognizer: Option<ScriptedRecognizer>,
        source: Arc<StaticSource>,
        resume_text: Option<&str>,
    ) -> Self {
        let supported = recognizer.clone();
        let voice = Arc::new(VoiceAdapter::new(
            synth.clone(),
            supported.map(|r| Arc::new(r) as Arc<dyn SpeechRecognizer>),
            VoiceConfig::default(),
        ));

        let ended = Arc::new(Mutex::new(Vec::new()));
        let mut builder = InterviewSession::builder(config, voice, source.clone()).on_end({
            let ended = ended.clone();
            move |reason| ended.lock().unwrap().push(reason)
        });
        if let Some(text) = resume_text {
            builder = builder.resume_text(text);
        }

        Self {
            session: builder.start(),
            synth,
            recognizer: recognizer.unwrap_or_default(),
            source,
            ended,
        }
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn until(&self, predicate: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let mut rx = self.session.subscribe();
        tokio::time::timeout(Duration::from_secs(3600), rx.wait_for(predicate))
            .await
            .expect("state never reached")
            .expect("session task gone")
            .clone()
    }

    pub fn ended(&self) -> Vec<EndReason> {
        self.ended.lock().unwrap().clone()
    }
}
