//! Configuration management for the interview engine
//!
//! Values resolve as env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::passcode::PASSCODE_LEN;
use crate::{Error, Result};

/// Default chat completions endpoint for question generation
pub const DEFAULT_LLM_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Default model for question generation
pub const DEFAULT_LLM_MODEL: &str = "mistral-small-latest";

/// Default role the candidate is interviewed for
pub const DEFAULT_ROLE: &str = "Software Engineer";

/// Default demo passcode
pub const DEFAULT_PASSCODE: &str = "AIRA2024";

/// Longest accepted interview
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted silence timeout or pacing delay
pub const MAX_SESSION_DELAY: Duration = Duration::from_secs(60 * 60);

/// Interview engine configuration
#[derive(Debug)]
pub struct Config {
    /// Demo passcode checked before the session starts
    pub passcode: String,

    /// Session timing
    pub session: SessionConfig,

    /// Voice I/O
    pub voice: VoiceConfig,

    /// Question generation backend
    pub llm: LlmConfig,

    /// Resume source
    pub resume: ResumeConfig,
}

/// Session timing and limits
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Overall interview length
    pub duration: Duration,

    /// Silence before auto-advancing to the next question
    pub silence_timeout: Duration,

    /// Number of questions per session
    pub question_count: usize,

    /// Pause between loading questions and asking the first one
    pub first_question_delay: Duration,

    /// Delay before restarting recognition that ended on its own
    pub restart_delay: Duration,

    /// Pause between finishing one question and asking the next
    pub pacing_delay: Duration,

    /// Pause after the last question before the session ends
    pub settle_delay: Duration,

    /// Idle time after which the manual start affordance is shown
    pub stuck_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(15 * 60),
            silence_timeout: Duration::from_secs(20),
            question_count: 10,
            first_question_delay: Duration::from_millis(1000),
            restart_delay: Duration::from_millis(300),
            pacing_delay: Duration::from_millis(1200),
            settle_delay: Duration::from_millis(500),
            stuck_grace: Duration::from_secs(5),
        }
    }
}

/// Voice I/O configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Recognition and synthesis language tag
    pub language: String,

    /// Voice name substrings preferred when choosing a synthesis voice
    pub preferred_voice_markers: Vec<String>,

    /// How long to wait for an utterance to start before giving up on it
    pub speak_start_timeout: Duration,

    /// Upper bound on a started utterance that never reports its end
    pub max_utterance: Duration,

    /// How long to wait for the voice list to load
    pub voice_load_timeout: Duration,

    /// Pause after cancelling a previous utterance
    pub cancel_settle: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            preferred_voice_markers: vec![
                "Google".to_string(),
                "Natural".to_string(),
                "Premium".to_string(),
            ],
            speak_start_timeout: Duration::from_secs(5),
            max_utterance: Duration::from_secs(120),
            voice_load_timeout: Duration::from_millis(1000),
            cancel_settle: Duration::from_millis(200),
        }
    }
}

/// Question generation backend configuration
#[derive(Debug)]
pub struct LlmConfig {
    /// Chat completions endpoint
    pub api_url: String,

    /// Model identifier
    pub model: String,

    /// Bearer token; generation falls back to the static list without it
    pub api_key: Option<SecretString>,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token budget
    pub max_tokens: u32,

    /// Whole-request timeout
    pub request_timeout: Duration,

    /// Role the candidate is interviewing for
    pub role: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 2048,
            request_timeout: Duration::from_secs(30),
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// Resume source configuration
#[derive(Debug, Clone, Default)]
pub struct ResumeConfig {
    /// Endpoint returning the resume file
    pub url: Option<String>,

    /// Local resume file
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passcode: DEFAULT_PASSCODE.to_string(),
            session: SessionConfig::default(),
            voice: VoiceConfig::default(),
            llm: LlmConfig::default(),
            resume: ResumeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn resolve(
        fc: file::AiraConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let env_u64 = |key: &str| env(key).and_then(|v| v.trim().parse::<u64>().ok());

        let session = SessionConfig {
            duration: env_u64("AIRA_SESSION_SECS")
                .or(fc.session.duration_secs)
                .map_or(defaults.session.duration, Duration::from_secs),
            silence_timeout: env_u64("AIRA_SILENCE_SECS")
                .or(fc.session.silence_timeout_secs)
                .map_or(defaults.session.silence_timeout, Duration::from_secs),
            question_count: env("AIRA_QUESTION_COUNT")
                .and_then(|v| v.trim().parse().ok())
                .or(fc.session.question_count)
                .unwrap_or(defaults.session.question_count),
            first_question_delay: fc
                .session
                .first_question_delay_ms
                .map_or(defaults.session.first_question_delay, Duration::from_millis),
            restart_delay: fc
                .session
                .restart_delay_ms
                .map_or(defaults.session.restart_delay, Duration::from_millis),
            pacing_delay: fc
                .session
                .pacing_delay_ms
                .map_or(defaults.session.pacing_delay, Duration::from_millis),
            settle_delay: fc
                .session
                .settle_delay_ms
                .map_or(defaults.session.settle_delay, Duration::from_millis),
            stuck_grace: fc
                .session
                .stuck_grace_secs
                .map_or(defaults.session.stuck_grace, Duration::from_secs),
        };

        let voice = VoiceConfig {
            language: fc.voice.language.unwrap_or(defaults.voice.language),
            preferred_voice_markers: fc
                .voice
                .preferred_voice_markers
                .unwrap_or(defaults.voice.preferred_voice_markers),
            speak_start_timeout: fc
                .voice
                .speak_start_timeout_ms
                .map_or(defaults.voice.speak_start_timeout, Duration::from_millis),
            max_utterance: fc
                .voice
                .max_utterance_secs
                .map_or(defaults.voice.max_utterance, Duration::from_secs),
            voice_load_timeout: fc
                .voice
                .voice_load_timeout_ms
                .map_or(defaults.voice.voice_load_timeout, Duration::from_millis),
            cancel_settle: fc
                .voice
                .cancel_settle_ms
                .map_or(defaults.voice.cancel_settle, Duration::from_millis),
        };

        let llm = LlmConfig {
            api_url: env("AIRA_LLM_URL")
                .or(fc.llm.api_url)
                .unwrap_or(defaults.llm.api_url),
            model: env("AIRA_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(defaults.llm.model),
            api_key: env("AIRA_LLM_API_KEY")
                .or_else(|| env("MISTRAL_API_KEY"))
                .or(fc.llm.api_key)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            temperature: fc.llm.temperature.unwrap_or(defaults.llm.temperature),
            max_tokens: fc.llm.max_tokens.unwrap_or(defaults.llm.max_tokens),
            request_timeout: fc
                .llm
                .request_timeout_secs
                .map_or(defaults.llm.request_timeout, Duration::from_secs),
            role: env("AIRA_ROLE")
                .or(fc.llm.role)
                .unwrap_or(defaults.llm.role),
        };

        let resume = ResumeConfig {
            url: env("AIRA_RESUME_URL").or(fc.resume.url),
            path: env("AIRA_RESUME_PATH")
                .or(fc.resume.path)
                .map(PathBuf::from),
        };

        let config = Self {
            passcode: env("AIRA_PASSCODE")
                .or(fc.passcode)
                .unwrap_or(defaults.passcode),
            session,
            voice,
            llm,
            resume,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the session relies on
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.passcode.len() != PASSCODE_LEN
            || !self.passcode.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::Config(format!(
                "passcode must be {PASSCODE_LEN} alphanumeric characters"
            )));
        }

        if self.session.duration.is_zero() {
            return Err(Error::Config("session duration must be positive".to_string()));
        }

        if self.session.silence_timeout.is_zero() {
            return Err(Error::Config("silence timeout must be positive".to_string()));
        }

        if self.session.duration > MAX_SESSION_DURATION {
            return Err(Error::Config(format!(
                "session duration must be at most {}s",
                MAX_SESSION_DURATION.as_secs()
            )));
        }

        let delays = [
            ("silence timeout", self.session.silence_timeout),
            ("first question delay", self.session.first_question_delay),
            ("restart delay", self.session.restart_delay),
            ("pacing delay", self.session.pacing_delay),
            ("settle delay", self.session.settle_delay),
            ("stuck grace", self.session.stuck_grace),
        ];
        if let Some((name, _)) = delays.iter().find(|(_, d)| *d > MAX_SESSION_DELAY) {
            return Err(Error::Config(format!(
                "{name} must be at most {}s",
                MAX_SESSION_DELAY.as_secs()
            )));
        }

        if self.session.question_count == 0 {
            return Err(Error::Config("question count must be positive".to_string()));
        }

        if self.voice.speak_start_timeout.is_zero() {
            return Err(Error::Config("speak start timeout must be positive".to_string()));
        }

        Ok(())
    }
}
