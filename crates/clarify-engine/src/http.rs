//! Remote enhancement over HTTP.

use async_trait::async_trait;
use reqwest::multipart;
use std::path::Path;
use tracing::debug;

use crate::enhancer::Enhancer;
use crate::error::{EngineError, EngineResult};

/// How many response characters to keep when reporting a rejection.
const DETAIL_LIMIT: usize = 512;

/// Posts each segment to a remote enhancement service.
///
/// The segment travels as a `file` multipart part. The service stages
/// its result where the shared staging tree makes it observable; only
/// the HTTP status comes back here.
pub struct HttpEnhancer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEnhancer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Use a pre-configured client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Enhancer for HttpEnhancer {
    async fn enhance(&self, input: &Path, _output: &Path) -> EngineResult<()> {
        let bytes = tokio::fs::read(input).await?;
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "segment".to_string());

        debug!(endpoint = %self.endpoint, file = %file_name, "posting segment to engine");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail: String = body.chars().take(DETAIL_LIMIT).collect();
        Err(EngineError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    fn label(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn staged_segment(dir: &TempDir) -> PathBuf {
        let p = dir.path().join("j_chunk_0.wav");
        tokio::fs::write(&p, b"RIFFdata").await.unwrap();
        p
    }

    #[tokio::test]
    async fn test_accepted_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process_audio"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let input = staged_segment(&dir).await;

        let enhancer = HttpEnhancer::new(format!("{}/process_audio", server.uri()));
        enhancer.enhance(&input, Path::new("unused")).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_segment_carries_status_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let input = staged_segment(&dir).await;

        let enhancer = HttpEnhancer::new(server.uri());
        let err = enhancer
            .enhance(&input, Path::new("unused"))
            .await
            .unwrap_err();

        match err {
            EngineError::Rejected { status, detail } => {
                assert_eq!(status, 500);
                assert!(detail.contains("model crashed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let enhancer = HttpEnhancer::new("http://localhost:1/process_audio");
        let err = enhancer
            .enhance(Path::new("/nonexistent/j_chunk_0.wav"), Path::new("unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
