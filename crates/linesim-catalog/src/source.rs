//! Catalog sources.
//!
//! A source only fetches and decodes JSON. Interpreting the payload is left
//! to [`crate::ingest`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{CatalogError, CatalogResult};

/// Maximum number of body characters kept in a parse error.
const SNIPPET_CHARS: usize = 120;

/// Largest response body accepted from an HTTP endpoint.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Redirect hops followed before giving up. Script deployments answer with
/// a redirect to a content host.
const MAX_REDIRECTS: usize = 10;

/// Something that can produce the raw catalog payload.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch and decode the payload.
    async fn fetch(&self) -> CatalogResult<Value>;

    /// Human-readable description for logs and status output.
    fn describe(&self) -> String;
}

/// Catalog served over HTTP(S), typically by a spreadsheet script endpoint.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    url: Url,
    client: reqwest::Client,
}

impl HttpCatalog {
    /// Create a source for `url` with the given request timeout.
    pub fn new(url: &str, timeout: Duration) -> CatalogResult<Self> {
        let parsed = Url::parse(url).map_err(|e| CatalogError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidUrl {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            url: parsed,
            client,
        })
    }

    /// The endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> CatalogResult<Value> {
        info!(url = %self.url, "fetching scenario catalog");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        let body = read_limited(response, MAX_BODY_BYTES).await?;
        debug!(bytes = body.len(), status = status.as_u16(), "catalog response received");

        if !status.is_success() {
            // Script endpoints report failures as `{"error": "..."}` bodies.
            if let Some(message) = error_message(&body) {
                return Err(CatalogError::Server(message));
            }
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }
        decode(&String::from_utf8_lossy(&body))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Catalog read from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    /// Create a source for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn fetch(&self) -> CatalogResult<Value> {
        info!(path = %self.path.display(), "reading scenario catalog");
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;
        decode(&body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Catalog held in memory.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    payload: Value,
}

impl StaticCatalog {
    /// Wrap an already-decoded payload.
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self) -> CatalogResult<Value> {
        Ok(self.payload.clone())
    }

    fn describe(&self) -> String {
        "in-memory catalog".to_string()
    }
}

/// Read a response body, failing once it grows past `limit` bytes.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> CatalogResult<Vec<u8>> {
    let declared = response.content_length().unwrap_or(0);
    if declared > u64::try_from(limit).unwrap_or(u64::MAX) {
        return Err(CatalogError::TooLarge { limit });
    }

    let mut body = Vec::with_capacity(usize::try_from(declared).unwrap_or(0));
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?
    {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(CatalogError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// The `error` string of a JSON object body, if there is one.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("error")?.as_str().map(str::to_owned)
}

/// Decode a response body, keeping a short snippet on failure.
fn decode(body: &str) -> CatalogResult<Value> {
    serde_json::from_str(body).map_err(|e| CatalogError::Parse {
        message: e.to_string(),
        snippet: body.chars().take(SNIPPET_CHARS).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve exactly one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: impl Into<String>) -> String {
        let body: String = body.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            // The client may hang up early on oversized bodies.
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/exec")
    }

    #[test]
    fn rejects_bad_urls() {
        let err = HttpCatalog::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUrl { .. }));

        let err = HttpCatalog::new("ftp://example.com/x", Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[tokio::test]
    async fn http_fetch_decodes_json() {
        let url = serve_once("HTTP/1.1 200 OK", r#"[{"id":"a","messages":[]}]"#).await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        let value = source.fetch().await.unwrap();
        assert_eq!(value, json!([{"id": "a", "messages": []}]));
    }

    #[tokio::test]
    async fn http_status_error() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", "oops").await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn http_error_status_with_error_body_is_server_error() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error":"quota exceeded"}"#,
        )
        .await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::Server(ref m) if m == "quota exceeded"));
    }

    #[tokio::test]
    async fn http_oversized_body_is_rejected() {
        let body = " ".repeat(MAX_BODY_BYTES.saturating_add(1));
        let url = serve_once("HTTP/1.1 200 OK", body).await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::TooLarge { limit: MAX_BODY_BYTES }));
    }

    #[tokio::test]
    async fn http_body_at_the_limit_is_accepted() {
        let padding = MAX_BODY_BYTES.saturating_sub(2);
        let body = format!("[{}]", " ".repeat(padding));
        assert_eq!(body.len(), MAX_BODY_BYTES);
        let url = serve_once("HTTP/1.1 200 OK", body).await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(source.fetch().await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn http_non_json_body_is_parse_error() {
        let url = serve_once("HTTP/1.1 200 OK", "<html>login required</html>").await;
        let source = HttpCatalog::new(&url, Duration::from_secs(5)).unwrap();
        match source.fetch().await.unwrap_err() {
            CatalogError::Parse { snippet, .. } => assert!(snippet.starts_with("<html>")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_catalog_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"error": "quota exceeded"}}"#).unwrap();

        let source = FileCatalog::new(file.path());
        let value = source.fetch().await.unwrap();
        assert_eq!(value, json!({"error": "quota exceeded"}));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileCatalog::new(dir.path().join("missing.json"));
        assert!(matches!(
            source.fetch().await.unwrap_err(),
            CatalogError::Io { .. }
        ));
    }

    #[tokio::test]
    async fn static_catalog_returns_payload() {
        let source = StaticCatalog::new(json!([]));
        assert_eq!(source.fetch().await.unwrap(), json!([]));
        assert_eq!(source.describe(), "in-memory catalog");
    }
}
