//! Resume text extraction
//!
//! Plain text is read as-is. PDFs go through `pdftotext` when it is on
//! `PATH`. Anything else is accepted only if it mostly looks like text.
//! Extraction never fails: problems turn into a bracketed placeholder the
//! question source can still work with.

use std::io::Write;
use std::path::Path;

use super::ResumeFile;
use crate::{Error, Result};

/// Minimum share of printable characters for unknown files to count as text
const MIN_PRINTABLE_RATIO: f64 = 0.7;

/// Extract resume text from `file`
pub async fn extract_text(file: &ResumeFile) -> String {
    let lower = file.name.to_ascii_lowercase();

    if lower.ends_with(".txt") || lower.ends_with(".md") {
        return String::from_utf8_lossy(&file.bytes).into_owned();
    }

    if lower.ends_with(".pdf") {
        return match pdf_text(&file.bytes).await {
            Ok(text) if text.is_empty() => {
                format!("[Resume: {} - No extractable text found in PDF]", file.name)
            }
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "PDF extraction error");
                format!("[Resume: {} - PDF text extraction failed]", file.name)
            }
        };
    }

    let text = String::from_utf8_lossy(&file.bytes);
    if printable_ratio(&text) > MIN_PRINTABLE_RATIO {
        return text.into_owned();
    }

    format!(
        "[Resume file: {} - Unable to extract text. File type: {}]",
        file.name,
        file.mime.as_deref().unwrap_or_default()
    )
}

/// Share of characters in the printable ASCII range; 0 for empty text
#[must_use]
pub fn printable_ratio(text: &str) -> f64 {
    let (printable, total) = text.chars().fold((0u32, 0u32), |(p, t), c| {
        (p + u32::from((' '..='~').contains(&c)), t + 1)
    });

    if total == 0 {
        0.0
    } else {
        f64::from(printable) / f64::from(total)
    }
}

/// Extract PDF text page by page, pages separated by a blank line
async fn pdf_text(bytes: &[u8]) -> Result<String> {
    let program = which::which("pdftotext")
        .map_err(|e| Error::Resume(format!("pdftotext not available: {e}")))?;

    let mut input = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    input.write_all(bytes)?;
    input.flush()?;

    run_pdftotext(&program, input.path()).await
}

async fn run_pdftotext(program: &Path, input: &Path) -> Result<String> {
    let output = tokio::process::Command::new(program)
        .args(["-enc", "UTF-8"])
        .arg(input)
        .arg("-")
        .output()
        .await
        .map_err(|e| Error::Resume(format!("failed to run pdftotext: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Resume(format!(
            "pdftotext exited with code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|page| page.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|page| !page.is_empty())
        .collect();

    Ok(pages.join("\n\n"))
}
