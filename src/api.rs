// API module: wire types for the analysis endpoint, the `Transport` seam the
// submission controller talks through, and an HTTP implementation built on
// reqwest.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Fixed path of the analysis endpoint, relative to the configured base URL.
pub const ANALYZE_PATH: &str = "/api/analyze";

/// Body of `POST /api/analyze`. Built from the form at submit time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub config_path: String,
    pub base_dir: String,
}

/// Success payload. The backend also reports where consolidated results
/// were written; older servers omit it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

/// Failure payload returned with non-2xx statuses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub error: String,
}

/// Every way a submission can fail after the request was built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitFailure {
    /// No response at all: connection refused, DNS, reset mid-body.
    #[error("network failure: {reason}")]
    Network { reason: String },

    /// Non-2xx with a well-formed `{"error": ...}` body.
    #[error("server returned {status}: {error}")]
    Server { status: u16, error: String },

    /// A response arrived but lacked the expected field.
    #[error("malformed response (HTTP {status}): {detail}")]
    Malformed { status: u16, detail: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl SubmitFailure {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn malformed(status: u16, detail: impl Into<String>) -> Self {
        Self::Malformed {
            status,
            detail: detail.into(),
        }
    }
}

/// Result of one settled request.
pub type Outcome = Result<AnalysisResponse, SubmitFailure>;

/// Capability to issue one POST to the analysis service.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn post(&self, url: &str, body: &AnalysisRequest) -> Outcome;
}

/// Turn a status code and raw body into an outcome.
///
/// 2xx must carry `{"message": ...}`; anything else must carry
/// `{"error": ...}`. Bodies that don't match become `Malformed` rather than
/// being trusted.
pub fn classify(status: u16, body: &[u8]) -> Outcome {
    if (200..300).contains(&status) {
        serde_json::from_slice::<AnalysisResponse>(body)
            .map_err(|e| SubmitFailure::malformed(status, e.to_string()))
    } else {
        match serde_json::from_slice::<AnalysisError>(body) {
            Ok(payload) => Err(SubmitFailure::Server {
                status,
                error: payload.error,
            }),
            Err(e) => Err(SubmitFailure::malformed(status, e.to_string())),
        }
    }
}

/// reqwest-backed transport. Timeouts are applied by the submission
/// controller, not by the client, so one policy covers every transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("analysis-form/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &AnalysisRequest) -> Outcome {
        tracing::debug!(%url, ?body, "POST");
        let res = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SubmitFailure::network(e.to_string()))?;

        let status = res.status().as_u16();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| SubmitFailure::network(e.to_string()))?;
        tracing::debug!(status, len = bytes.len(), "response received");

        classify(status, &bytes)
    }
}

/// Join the base URL and the fixed endpoint path.
pub fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH)
}
