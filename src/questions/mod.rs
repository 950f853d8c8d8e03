//! Question source
//!
//! Turns resume text into an ordered list of interview questions through a
//! remote completion backend, falling back to a fixed list whenever the
//! backend is missing, fails, or returns something unusable.

mod client;
mod fallback;
mod parse;
mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use client::ChatCompletionClient;
pub use fallback::{FALLBACK_QUESTION_COUNT, candidate_name_from_resume, fallback_analysis};
pub use parse::{extract_json_object, parse_analysis};
pub use prompt::build_prompt;

use crate::{Error, Result};

/// Resume text used when no resume could be loaded
pub const NO_RESUME_PLACEHOLDER: &str = "[No resume provided - use general interview questions]";

/// One interview question and its progress flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRecord {
    /// 1-based display id
    pub id: u32,
    /// Short category label (e.g. "Introduction")
    pub label: String,
    /// Full question text as spoken
    pub text: String,
    pub completed: bool,
    pub is_current: bool,
}

impl QuestionRecord {
    /// A pending question
    #[must_use]
    pub fn new(id: u32, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            text: text.into(),
            completed: false,
            is_current: false,
        }
    }
}

/// Result of analysing a resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeAnalysis {
    pub candidate_name: String,
    pub skills: Vec<String>,
    pub experience: String,
    /// Ordered questions; the first is marked current
    pub questions: Vec<QuestionRecord>,
}

/// Produces the questions for a session; never fails
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, resume_text: &str) -> ResumeAnalysis;
}

/// Remote text completion used for question generation
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete `prompt`, returning the raw response text
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or empty output
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Question source backed by a completion backend with a static fallback
pub struct QuestionGenerator {
    backend: Option<Arc<dyn CompletionBackend>>,
    role: String,
    count: usize,
}

impl QuestionGenerator {
    /// Create a generator; without a backend every call uses the fallback list
    #[must_use]
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, role: impl Into<String>, count: usize) -> Self {
        Self {
            backend,
            role: role.into(),
            count: count.max(1),
        }
    }

    /// Generate questions through the backend only
    ///
    /// # Errors
    ///
    /// Returns error if no backend is configured, the call fails, or the
    /// response cannot be parsed
    pub async fn try_generate(&self, resume_text: &str) -> Result<ResumeAnalysis> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| Error::Generation("no completion backend configured".to_string()))?;

        let prompt = build_prompt(resume_text, &self.role, self.count);
        tracing::debug!(role = %self.role, count = self.count, "requesting questions");

        let raw = backend.complete(&prompt).await?;
        parse_analysis(&raw, self.count)
    }
}

#[async_trait]
impl QuestionSource for QuestionGenerator {
    async fn generate(&self, resume_text: &str) -> ResumeAnalysis {
        match self.try_generate(resume_text).await {
            Ok(analysis) => {
                tracing::info!(
                    count = analysis.questions.len(),
                    candidate = %analysis.candidate_name,
                    "generated interview questions"
                );
                analysis
            }
            Err(e) => {
                tracing::warn!(error = %e, "question generation failed, using fallback questions");
                fallback_analysis(resume_text, self.count)
            }
        }
    }
}
