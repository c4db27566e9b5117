//! Page text extraction through poppler's `pdftotext` and `pdfinfo`.

use std::ffi::OsStr;
use std::io::Write;

use async_trait::async_trait;
use docqa_core::RetrievalError;
use tokio::process::Command;
use tracing::{debug, warn};

/// Text of a document, one entry per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: Option<String>,
    pub pages: Vec<String>,
}

#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, url: &str, bytes: &[u8]) -> Result<ExtractedDocument, RetrievalError>;
}

/// Runs the poppler command-line tools on a temporary copy of the PDF.
#[derive(Debug, Clone)]
pub struct PopplerExtractor {
    pdftotext: String,
    pdfinfo: String,
}

impl Default for PopplerExtractor {
    fn default() -> Self {
        Self {
            pdftotext: "pdftotext".to_string(),
            pdfinfo: "pdfinfo".to_string(),
        }
    }
}

impl PopplerExtractor {
    #[must_use]
    pub fn with_programs(pdftotext: impl Into<String>, pdfinfo: impl Into<String>) -> Self {
        Self {
            pdftotext: pdftotext.into(),
            pdfinfo: pdfinfo.into(),
        }
    }

    async fn run(program: &str, args: &[&OsStr]) -> anyhow::Result<String> {
        let output = Command::new(program).args(args).output().await?;

        if !output.status.success() {
            anyhow::bail!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PageExtractor for PopplerExtractor {
    async fn extract(&self, url: &str, bytes: &[u8]) -> Result<ExtractedDocument, RetrievalError> {
        let extraction_error = |reason: String| RetrievalError::Extraction {
            url: url.to_string(),
            reason,
        };

        let mut file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| extraction_error(format!("failed to create temp file: {e}")))?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| extraction_error(format!("failed to write temp file: {e}")))?;

        let path = file.path().as_os_str();
        let text = Self::run(
            &self.pdftotext,
            &[OsStr::new("-layout"), path, OsStr::new("-")],
        )
        .await
        .map_err(|e| extraction_error(e.to_string()))?;
        let pages = split_pages(&text);
        debug!("Extracted {} pages from {url}", pages.len());

        let title = match Self::run(&self.pdfinfo, &[path]).await {
            Ok(info) => parse_title(&info),
            Err(e) => {
                warn!("Metadata lookup failed for {url}: {e}");
                None
            }
        };

        Ok(ExtractedDocument { title, pages })
    }
}

/// `pdftotext` ends every page with a form feed.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\u{c}').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn parse_title(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.strip_prefix("Title:"))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}
