//! Resume retrieval from disk or HTTP

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ResumeFile;
use crate::{Error, Result};

/// File name used when the server does not provide one
pub const DEFAULT_FILE_NAME: &str = "resume.pdf";

static DISPOSITION_FILENAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"filename="?([^";]+)"?"#).ok());

/// File name from a `Content-Disposition` header value
#[must_use]
pub fn filename_from_disposition(header: Option<&str>) -> String {
    header
        .and_then(|value| {
            DISPOSITION_FILENAME
                .as_ref()?
                .captures(value)?
                .get(1)
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// Download a resume, bypassing caches
///
/// # Errors
///
/// Returns error on transport failure or a non-success status
pub async fn fetch_resume(client: &reqwest::Client, url: &str) -> Result<ResumeFile> {
    tracing::debug!(url, "fetching resume");

    let response = client
        .get(url)
        .header(reqwest::header::CACHE_CONTROL, "no-store")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Resume(format!("resume fetch failed with {status}")));
    }

    let headers = response.headers();
    let name = filename_from_disposition(
        headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
    );
    let mime = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let bytes = response.bytes().await?.to_vec();

    Ok(ResumeFile { name, mime, bytes })
}

/// Read a resume from disk
///
/// # Errors
///
/// Returns error if the file cannot be read
pub async fn read_resume(path: &Path) -> Result<ResumeFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Resume(format!("failed to read {}: {e}", path.display())))?;

    let name = path
        .file_name()
        .map_or_else(|| DEFAULT_FILE_NAME.to_string(), |n| n.to_string_lossy().into_owned());

    Ok(ResumeFile {
        mime: guess_mime(&name).map(ToString::to_string),
        name,
        bytes,
    })
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn disposition_filename() {
        assert_eq!(filename_from_disposition(None), "resume.pdf");
        assert_eq!(filename_from_disposition(Some("inline")), "resume.pdf");
        assert_eq!(
            filename_from_disposition(Some(r#"attachment; filename="jane_doe.pdf""#)),
            "jane_doe.pdf"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=cv.txt; size=10")),
            "cv.txt"
        );
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime("CV.PDF"), Some("application/pdf"));
        assert_eq!(guess_mime("notes"), None);
    }

    #[tokio::test]
    async fn fetch_reads_headers_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/getfile/abc", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await.unwrap();
            let body = "Grace Hopper\nCOBOL";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-disposition: attachment; filename=\"grace.txt\"\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        let file = fetch_resume(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(file.name, "grace.txt");
        assert_eq!(file.mime.as_deref(), Some("text/plain"));
        assert_eq!(file.bytes, b"Grace Hopper\nCOBOL");
    }

    #[tokio::test]
    async fn fetch_rejects_error_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/getfile/abc", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        assert!(matches!(
            fetch_resume(&reqwest::Client::new(), &url).await,
            Err(Error::Resume(_))
        ));
    }
}
