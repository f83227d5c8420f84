//! REST client for the obfuscation service HTTP endpoints.
//!
//! [`ObfuscatorApi`] wraps the backend API (artifact analysis, job
//! submission, status polling, result retrieval, history, health) using
//! [`reqwest`]. Every response body is an envelope carrying a `success` flag
//! next to the payload fields; helpers here normalize transport failures,
//! non-2xx statuses, and `success: false` envelopes into the crate error
//! taxonomy so callers only see decoded values.

use serde::Deserialize;

use crate::error::{Error, Result, SubmissionError};
use crate::types::{Artifact, HistoryEntry, JobId, JobStatus, TransformOptions};

const JAR_MIME: &str = "application/java-archive";

/// HTTP client for a single obfuscation service instance.
#[derive(Clone)]
pub struct ObfuscatorApi {
    client: reqwest::Client,
    base_url: String,
}

/// Result of the artifact analysis endpoint.
///
/// Empty strings from the backend are normalized to `None`.
#[derive(Clone, Debug)]
pub struct AnalyzeReport {
    /// Detected root package, if the backend found one
    pub main_package: Option<String>,
    /// Detected entry-point class, if any
    pub main_class: Option<String>,
    /// Number of application classes scanned
    pub total_classes: Option<u64>,
}

/// One decoded status snapshot for a job.
#[derive(Clone, Debug)]
pub struct StatusSnapshot {
    /// Remote lifecycle state
    pub status: JobStatus,
    /// Diagnostic message, populated for failed jobs
    pub error_message: Option<String>,
    /// Raw newline-delimited log text, if the backend attached any
    pub logs: Option<String>,
    /// Retrieval endpoint the backend advertises once the job completed
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    success: bool,
    #[serde(default)]
    main_package: Option<String>,
    #[serde(default)]
    main_class: Option<String>,
    #[serde(default)]
    total_classes: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    success: bool,
    #[serde(default)]
    status: Option<JobStatus>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    logs: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    success: bool,
    #[serde(default)]
    jobs: Vec<HistoryEntry>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
}

impl ObfuscatorApi {
    /// Create a new API client.
    ///
    /// * `base_url` - base API URL, e.g. `http://host:8080/api`. A trailing
    ///   slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across several controllers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Base API URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the backend to analyze an artifact and suggest a scope filter.
    ///
    /// Sends a `POST /analyze` multipart request carrying the payload.
    pub async fn analyze(&self, artifact: &Artifact) -> Result<AnalyzeReport> {
        let form = reqwest::multipart::Form::new().part("file", Self::file_part(artifact)?);

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed: AnalyzeResponse = response.json().await?;

        if !parsed.success {
            return Err(Error::Backend(
                parsed.error.unwrap_or_else(|| "analysis failed".to_string()),
            ));
        }

        Ok(AnalyzeReport {
            main_package: parsed.main_package.filter(|p| !p.is_empty()),
            main_class: parsed.main_class.filter(|c| !c.is_empty()),
            total_classes: parsed.total_classes,
        })
    }

    /// Submit an artifact with its transformation options.
    ///
    /// Sends a `POST /obfuscate` multipart request with the payload as the
    /// `file` part and the serialized options as the `config` part. Exactly
    /// one exchange per call — a failed submission is terminal for that
    /// attempt and is never retried here.
    pub async fn submit(
        &self,
        artifact: &Artifact,
        options: &TransformOptions,
    ) -> std::result::Result<JobId, SubmissionError> {
        let config_json = serde_json::to_string(options)
            .map_err(|e| SubmissionError::Transport(format!("failed to encode options: {e}")))?;
        let part =
            Self::file_part(artifact).map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("config", config_json);

        let response = self
            .client
            .post(format!("{}/obfuscate", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        // Rejections come back as 4xx/5xx with the same JSON envelope, so the
        // body is decoded before the status code decides anything.
        let parsed: SubmitResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(SubmissionError::Transport(format!(
                    "backend returned status {status}"
                )));
            }
            Err(e) => {
                return Err(SubmissionError::Transport(format!(
                    "malformed response: {e}"
                )));
            }
        };

        if !parsed.success {
            return Err(SubmissionError::Rejected {
                reason: parsed
                    .error
                    .unwrap_or_else(|| format!("backend returned status {status}")),
            });
        }

        match parsed.job_id {
            Some(id) if !id.is_empty() => Ok(JobId::new(id)),
            _ => Err(SubmissionError::Transport(
                "response missing job id".to_string(),
            )),
        }
    }

    /// Query the current status of a job.
    ///
    /// Sends a `GET /status/{jobId}` request. The job identifier is an opaque
    /// backend string and is percent-encoded into the path.
    pub async fn status(&self, job_id: &JobId) -> Result<StatusSnapshot> {
        let response = self
            .client
            .get(format!(
                "{}/status/{}",
                self.base_url,
                urlencoding::encode(job_id.as_str())
            ))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed: StatusResponse = response.json().await?;

        if !parsed.success {
            return Err(Error::Backend(
                parsed
                    .error
                    .unwrap_or_else(|| "status query failed".to_string()),
            ));
        }

        let status = parsed
            .status
            .ok_or_else(|| Error::Backend("response missing job status".to_string()))?;

        Ok(StatusSnapshot {
            status,
            error_message: parsed.error_message,
            logs: parsed.logs,
            download_url: parsed.download_url,
        })
    }

    /// Retrieval endpoint for a completed job's result.
    ///
    /// Pure derivation from the job identifier — no request is made and no
    /// state is consulted; the presentation layer gates when to navigate.
    pub fn download_url(&self, job_id: &JobId) -> String {
        format!(
            "{}/download/{}",
            self.base_url,
            urlencoding::encode(job_id.as_str())
        )
    }

    /// Fetch the most recent jobs from the backend history.
    ///
    /// Sends a `GET /history` request, with a `limit` query parameter when one
    /// is given.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let mut request = self.client.get(format!("{}/history", self.base_url));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await?;
        let response = Self::ensure_success(response).await?;
        let parsed: HistoryResponse = response.json().await?;

        if !parsed.success {
            return Err(Error::Backend(
                parsed
                    .error
                    .unwrap_or_else(|| "history query failed".to_string()),
            ));
        }

        Ok(parsed.jobs)
    }

    /// Check whether the backend reports itself healthy.
    ///
    /// Sends a `GET /health` request; `Ok(true)` only for an explicit
    /// `status: "ok"`. Transport failures surface as `Err` so callers can
    /// distinguish "unreachable" from "reachable but unhealthy".
    pub async fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed: HealthResponse = response.json().await?;
        Ok(parsed.status.as_deref() == Some("ok"))
    }

    // ---- private helpers ----

    fn file_part(artifact: &Artifact) -> Result<reqwest::multipart::Part> {
        let part = reqwest::multipart::Part::bytes(artifact.payload().to_vec())
            .file_name(artifact.name().to_string())
            .mime_str(JAR_MIME)?;
        Ok(part)
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or [`Error::Api`] with the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}
