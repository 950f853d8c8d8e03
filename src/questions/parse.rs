//! Generation response parsing
//!
//! The remote service does not reliably return bare JSON, so only the span
//! from the first `{` to the last `}` is parsed. Field types are checked
//! strictly; absent fields are filled with defaults.

use serde::Deserialize;

use super::{QuestionRecord, ResumeAnalysis};
use crate::{Error, Result};

const DEFAULT_CANDIDATE_NAME: &str = "Candidate";
const DEFAULT_EXPERIENCE: &str = "Not specified";
const DEFAULT_LABEL: &str = "Question";
const DEFAULT_QUESTION: &str = "Tell me more about your experience.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    candidate_name: Option<String>,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    experience: Option<String>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

/// Slice from the first `{` to the last `}` of `raw`
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// Parse a generation response into at most `max_questions` questions
///
/// # Errors
///
/// Returns `Error::Parse` if no object can be located, the object does not
/// match the expected shape, or it contains no questions
pub fn parse_analysis(raw: &str, max_questions: usize) -> Result<ResumeAnalysis> {
    let object = extract_json_object(raw.trim())
        .ok_or_else(|| Error::Parse("no JSON object in response".to_string()))?;

    let parsed: RawAnalysis =
        serde_json::from_str(object).map_err(|e| Error::Parse(format!("invalid analysis: {e}")))?;

    let questions: Vec<QuestionRecord> = parsed
        .questions
        .unwrap_or_default()
        .into_iter()
        .take(max_questions)
        .enumerate()
        .map(|(idx, q)| {
            let position = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            QuestionRecord {
                id: q.id.filter(|id| *id != 0).unwrap_or(position),
                label: non_empty(q.label).unwrap_or_else(|| DEFAULT_LABEL.to_string()),
                text: non_empty(q.question).unwrap_or_else(|| DEFAULT_QUESTION.to_string()),
                completed: false,
                is_current: idx == 0,
            }
        })
        .collect();

    if questions.is_empty() {
        return Err(Error::Parse("response contained no questions".to_string()));
    }

    Ok(ResumeAnalysis {
        candidate_name: non_empty(parsed.candidate_name)
            .unwrap_or_else(|| DEFAULT_CANDIDATE_NAME.to_string()),
        skills: parsed.skills.unwrap_or_default(),
        experience: non_empty(parsed.experience).unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string()),
        questions,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
