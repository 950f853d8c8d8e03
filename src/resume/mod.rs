//! Resume loading
//!
//! A resume comes from a local file or an HTTP endpoint. Failing to load it
//! never blocks the interview; the question source simply gets a placeholder.

mod extract;
mod fetch;

pub use extract::{extract_text, printable_ratio};
pub use fetch::{DEFAULT_FILE_NAME, fetch_resume, filename_from_disposition, read_resume};

use crate::config::ResumeConfig;
use crate::questions::NO_RESUME_PLACEHOLDER;

/// A resume file as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub name: String,
    /// Reported or guessed media type
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// A loaded resume and the text extracted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeData {
    pub file_name: String,
    pub extracted_text: String,
}

impl ResumeData {
    /// Extract text from `file`
    pub async fn from_file(file: &ResumeFile) -> Self {
        Self {
            file_name: file.name.clone(),
            extracted_text: extract_text(file).await,
        }
    }
}

/// Text handed to the question source for an optional resume
#[must_use]
pub fn resume_text(resume: Option<&ResumeData>) -> &str {
    resume.map_or(NO_RESUME_PLACEHOLDER, |r| r.extracted_text.as_str())
}

/// Load the configured resume; a local path wins over a URL
///
/// Returns `None` when nothing is configured or loading fails.
pub async fn load_resume(config: &ResumeConfig, client: &reqwest::Client) -> Option<ResumeData> {
    let file = if let Some(path) = &config.path {
        read_resume(path).await
    } else if let Some(url) = &config.url {
        fetch_resume(client, url).await
    } else {
        tracing::info!("no resume configured");
        return None;
    };

    match file {
        Ok(file) => {
            tracing::info!(file = %file.name, bytes = file.bytes.len(), "resume loaded");
            Some(ResumeData::from_file(&file).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load resume, continuing without it");
            None
        }
    }
}
