use std::time::Duration;

use async_trait::async_trait;
use docqa_core::RetrievalError;
use reqwest::Client;
use tracing::{debug, info};

/// Downloads the raw bytes of a document.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RetrievalError>;
}

/// HTTP download configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
    /// Maximum document size (bytes)
    pub max_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: "Mozilla/5.0 (compatible; docqa/1.0)".to_string(),
            max_size: 50 * 1024 * 1024,
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

/// Accept only absolute http(s) URLs.
pub(crate) fn validate_url(url: &str) -> Result<url::Url, RetrievalError> {
    let parsed = url::Url::parse(url).map_err(|e| RetrievalError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RetrievalError::InvalidUrl {
            url: url.to_string(),
            reason: "only http and https URLs are supported".to_string(),
        });
    }

    Ok(parsed)
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        let parsed = validate_url(url)?;
        let download_error = |reason: String| RetrievalError::Download {
            url: url.to_string(),
            reason,
        };

        info!("Downloading {url}");

        let response = self
            .client
            .get(parsed)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", "application/pdf, */*")
            .send()
            .await
            .map_err(|e| download_error(format!("HTTP request failed: {e}")))?
            .error_for_status()
            .map_err(|e| download_error(e.to_string()))?;

        if let Some(length) = response.content_length() {
            if usize::try_from(length).map_or(true, |l| l > self.config.max_size) {
                return Err(download_error(format!(
                    "document too large: {length} bytes (max: {})",
                    self.config.max_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_size {
            return Err(download_error(format!(
                "document too large: {} bytes (max: {})",
                bytes.len(),
                self.config.max_size
            )));
        }

        debug!("Downloaded {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.user_agent.contains("docqa"));
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("https://arxiv.org/pdf/1706.03762").is_ok());
        assert!(validate_url("http://localhost:8080/doc.pdf").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(RetrievalError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(RetrievalError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_request() {
        let Ok(fetcher) = HttpFetcher::new(FetchConfig::default()) else {
            panic!("fetcher should build");
        };
        let result = fetcher.fetch("ftp://example.com/doc.pdf").await;
        assert!(matches!(result, Err(RetrievalError::InvalidUrl { .. })));
    }

    fn fetcher(max_size: usize) -> HttpFetcher {
        let config = FetchConfig {
            max_size,
            ..FetchConfig::default()
        };
        let Ok(fetcher) = HttpFetcher::new(config) else {
            panic!("fetcher should build");
        };
        fetcher
    }

    #[tokio::test]
    async fn downloads_document_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper.pdf")
            .match_header("user-agent", "Mozilla/5.0 (compatible; docqa/1.0)")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4 body")
            .create_async()
            .await;

        let url = format!("{}/paper.pdf", server.url());
        let Ok(bytes) = fetcher(1024).fetch(&url).await else {
            panic!("download should succeed");
        };
        assert_eq!(bytes, b"%PDF-1.4 body");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn declared_length_over_cap_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big.pdf")
            .with_status(200)
            .with_body("x".repeat(100))
            .create_async()
            .await;

        let url = format!("{}/big.pdf", server.url());
        let result = fetcher(10).fetch(&url).await;
        let Err(RetrievalError::Download { reason, .. }) = result else {
            panic!("oversized document should be rejected");
        };
        assert!(reason.contains("too large"), "{reason}");
    }

    #[tokio::test]
    async fn streamed_body_over_cap_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream.pdf")
            .with_status(200)
            .with_chunked_body(|w| w.write_all(&[b'x'; 100]))
            .create_async()
            .await;

        let url = format!("{}/stream.pdf", server.url());
        let result = fetcher(10).fetch(&url).await;
        let Err(RetrievalError::Download { reason, .. }) = result else {
            panic!("oversized body should be rejected");
        };
        assert!(reason.contains("too large"), "{reason}");
    }

    #[tokio::test]
    async fn http_error_status_is_a_download_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.pdf")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing.pdf", server.url());
        let result = fetcher(1024).fetch(&url).await;
        assert!(matches!(result, Err(RetrievalError::Download { .. })));
    }
}
