//! TOML configuration file loading
//!
//! Supports `~/.config/aira/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AiraConfigFile {
    /// Demo passcode (8 alphanumeric characters)
    #[serde(default)]
    pub passcode: Option<String>,

    /// Session pacing and limits
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Voice I/O configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Question generation backend
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Resume source
    #[serde(default)]
    pub resume: ResumeFileConfig,
}

/// Session timing configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub duration_secs: Option<u64>,
    pub silence_timeout_secs: Option<u64>,
    pub question_count: Option<usize>,
    pub first_question_delay_ms: Option<u64>,
    pub restart_delay_ms: Option<u64>,
    pub pacing_delay_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub stuck_grace_secs: Option<u64>,
}

/// Voice I/O configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Recognition and synthesis language (e.g. "en-US")
    pub language: Option<String>,

    /// Substrings marking preferred high-quality voices
    pub preferred_voice_markers: Option<Vec<String>>,

    pub speak_start_timeout_ms: Option<u64>,
    pub max_utterance_secs: Option<u64>,
    pub voice_load_timeout_ms: Option<u64>,
    pub cancel_settle_ms: Option<u64>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Chat completions endpoint
    pub api_url: Option<String>,

    /// Model identifier (e.g. "mistral-small-latest")
    pub model: Option<String>,

    /// API key (env takes precedence)
    pub api_key: Option<String>,

    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,

    /// Role the candidate is interviewing for
    pub role: Option<String>,
}

/// Resume source configuration
#[derive(Debug, Default, Deserialize)]
pub struct ResumeFileConfig {
    /// Endpoint returning the resume file
    pub url: Option<String>,

    /// Local resume file
    pub path: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AiraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AiraConfigFile {
    let Some(path) = config_file_path() else {
        return AiraConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults with a warning.
pub fn load_config_file_from(path: &Path) -> AiraConfigFile {
    if !path.exists() {
        return AiraConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AiraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AiraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/aira/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("aira").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_overlay() {
        let fc: AiraConfigFile = toml::from_str(
            r#"
passcode = "ABCD1234"

[session]
silence_timeout_secs = 15

[llm]
model = "mistral-large-latest"
"#,
        )
        .unwrap();

        assert_eq!(fc.passcode.as_deref(), Some("ABCD1234"));
        assert_eq!(fc.session.silence_timeout_secs, Some(15));
        assert_eq!(fc.session.duration_secs, None);
        assert_eq!(fc.llm.model.as_deref(), Some("mistral-large-latest"));
        assert!(fc.voice.language.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("nope.toml"));
        assert!(fc.passcode.is_none());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session\nduration_secs = ").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.session.duration_secs.is_none());
    }
}
