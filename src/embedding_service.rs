use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    provider::{CollaboratorError, EmbeddingService, QueryEncoding},
};

pub const ENDPOINT_ENV_VAR: &str = "TALENTRANK_EMBEDDING_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of an error body kept in [`CollaboratorError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Text-to-vector service reached over HTTP.
///
/// Sends `{"jobId": ..., "jobDescription": ...}` and expects a 200 response
/// carrying `{"keywords": [...], "embedding": [...]}`, either at the top
/// level or inside a `"body"` field (object or JSON-encoded string).
pub struct HttpEmbeddingService {
    client: reqwest::blocking::Client,
    endpoint: String,
    expected_dimension: Option<usize>,
}

impl HttpEmbeddingService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::InvalidConfiguration(format!(
                    "failed to build HTTP client: {e}"
                ))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            expected_dimension: None,
        })
    }

    /// Resolve the endpoint from, in order of priority:
    /// 1. An explicit URL (from --embedding-url)
    /// 2. The [`ENDPOINT_ENV_VAR`] environment variable
    pub fn resolve(explicit: Option<&str>, timeout: Duration) -> Result<Self> {
        let endpoint = match explicit {
            Some(url) => url.to_string(),
            None => std::env::var(ENDPOINT_ENV_VAR).map_err(|_| {
                Error::InvalidConfiguration(format!(
                    "no embedding service configured; pass --embedding-url or set {ENDPOINT_ENV_VAR}"
                ))
            })?,
        };
        Self::new(&endpoint, timeout)
    }

    /// Reject encodings whose embedding is not `dimension` long.
    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingService for HttpEmbeddingService {
    fn encode(
        &self,
        query_id: &str,
        text: &str,
    ) -> std::result::Result<QueryEncoding, CollaboratorError> {
        let payload = serde_json::json!({
            "jobId": query_id,
            "jobDescription": text,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(map_transport_err)?;
        let status = response.status();
        let body = response.text().map_err(map_transport_err)?;

        if status != StatusCode::OK {
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        parse_encoding(&body, self.expected_dimension)
    }
}

fn map_transport_err(e: reqwest::Error) -> CollaboratorError {
    if e.is_timeout() {
        CollaboratorError::Timeout
    } else {
        CollaboratorError::Transport(e.to_string())
    }
}

#[derive(Deserialize)]
struct EncodingPayload {
    #[serde(default)]
    keywords: Vec<String>,
    embedding: Vec<f32>,
}

/// Parse and validate a service response body.
pub fn parse_encoding(
    body: &str,
    expected_dimension: Option<usize>,
) -> std::result::Result<QueryEncoding, CollaboratorError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        CollaboratorError::Malformed(format!("response is not JSON: {e}"))
    })?;

    let value = match value.get("body").cloned() {
        Some(Value::String(inner)) => {
            serde_json::from_str(&inner).map_err(|e| {
                CollaboratorError::Malformed(format!(
                    "\"body\" is not JSON: {e}"
                ))
            })?
        }
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    };

    let payload: EncodingPayload =
        serde_json::from_value(value).map_err(|e| {
            CollaboratorError::Malformed(format!("unexpected payload: {e}"))
        })?;

    if payload.embedding.is_empty() {
        return Err(CollaboratorError::Malformed("empty embedding".into()));
    }
    if payload.embedding.iter().any(|v| !v.is_finite()) {
        return Err(CollaboratorError::Malformed(
            "embedding contains non-finite values".into(),
        ));
    }
    if let Some(expected) = expected_dimension
        && payload.embedding.len() != expected
    {
        return Err(CollaboratorError::DimensionMismatch {
            expected,
            found: payload.embedding.len(),
        });
    }

    Ok(QueryEncoding {
        keywords: payload.keywords,
        embedding: payload.embedding,
    })
}
