//! Input resolution: turn a user-supplied path or URL into resume bytes.
//!
//! The PDF magic bytes (`%PDF`) are checked here so a wrong file is rejected
//! before anything is uploaded.

use crate::error::ReviewError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A resume ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    /// File name used for the upload, e.g. `jane-doe.pdf`.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Name of the preview image uploaded next to this resume.
    pub fn preview_name(&self) -> String {
        let stem = self
            .name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name);
        format!("{stem}.png")
    }

    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a resume from a local path or an http(s) URL.
pub async fn resolve_resume(input: &str, timeout_secs: u64) -> Result<ResumeFile, ReviewError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<ResumeFile, ReviewError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReviewError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ReviewError::Internal(format!("reading {}: {}", path.display(), e)),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume.pdf".to_string());
    let file = ResumeFile::new(name, bytes);
    check_magic(&file, path.to_path_buf())?;

    debug!("Resolved local resume: {}", path.display());
    Ok(file)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResumeFile, ReviewError> {
    info!("Downloading resume from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("timed out after {timeout_secs}s")
            } else {
                e.to_string()
            },
        })?;

    if !response.status().is_success() {
        return Err(ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let file = ResumeFile::new(filename_from_url(url), bytes.to_vec());
    check_magic(&file, PathBuf::from(url))?;
    info!("Downloaded {} bytes", file.bytes.len());
    Ok(file)
}

fn check_magic(file: &ResumeFile, origin: PathBuf) -> Result<(), ReviewError> {
    if file.is_pdf() {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = file.bytes.len().min(4);
    magic[..n].copy_from_slice(&file.bytes[..n]);
    Err(ReviewError::NotAPdf {
        path: origin,
        magic,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "resume.pdf".to_string()
}
