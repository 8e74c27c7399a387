/// Backend client: the single point of entry for calls to the
/// resume-processing service (summarize/match, CSV rendering, JD generation,
/// shortlisting).
///
/// Handlers only see the `ResumeBackend` trait, so tests swap in a stub.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::record::{MergedRecord, ProcessResponse, ScreeningMode};
use crate::screening::uploads::StagedFile;

#[cfg(test)]
pub mod stub;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backend returned empty content")]
    EmptyContent,
}

impl BackendError {
    /// Message the backend itself supplied, suitable for showing to the user.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            BackendError::Api {
                message: Some(m), ..
            } => Some(m.as_str()),
            _ => None,
        }
    }
}

/// Remote operations the screening console depends on.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    async fn process_resumes(
        &self,
        files: Vec<StagedFile>,
        mode: ScreeningMode,
        job_description: Option<String>,
    ) -> Result<ProcessResponse, BackendError>;

    async fn download_csv(&self, rows: &[MergedRecord]) -> Result<Bytes, BackendError>;

    async fn download_filtered_csv(
        &self,
        rows: &[MergedRecord],
        categories: &[String],
        percentage_threshold: f64,
    ) -> Result<Bytes, BackendError>;

    async fn generate_jd(&self, job_role: &str) -> Result<String, BackendError>;

    async fn shortlist(
        &self,
        rows: &[MergedRecord],
        percentage_threshold: f64,
        categories: &[String],
    ) -> Result<String, BackendError>;
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    summarized_data: &'a [MergedRecord],
}

#[derive(Debug, Serialize)]
struct FilteredExportRequest<'a> {
    summarized_data: &'a [MergedRecord],
    categories: &'a [String],
    percentage_threshold: f64,
}

#[derive(Debug, Serialize)]
struct ShortlistRequest<'a> {
    summarized_data: &'a [MergedRecord],
    percentage_threshold: f64,
    categories: &'a [String],
}

#[derive(Debug, Serialize)]
struct GenerateJdRequest<'a> {
    job_role: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateJdResponse {
    job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShortlistResponse {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: String,
}

/// HTTP implementation of [`ResumeBackend`]. Requests are issued once; there
/// is no retry.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned {}: {}", status, body);
        Err(BackendError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }

    async fn post_json_for_bytes<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Bytes, BackendError> {
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        let bytes = response.bytes().await?;
        debug!("Backend {} returned {} bytes", path, bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl ResumeBackend for HttpBackend {
    async fn process_resumes(
        &self,
        files: Vec<StagedFile>,
        mode: ScreeningMode,
        job_description: Option<String>,
    ) -> Result<ProcessResponse, BackendError> {
        let mut form = multipart::Form::new()
            .text("action", mode.as_str())
            .text("job_description", job_description.unwrap_or_default());

        for file in files {
            let mut part = multipart::Part::stream(file.bytes).file_name(file.filename);
            if let Some(content_type) = file.content_type.as_deref() {
                part = part.mime_str(content_type)?;
            }
            form = form.part("resumes", part);
        }

        let response = self
            .send(self.client.post(self.url("process_resumes")).multipart(form))
            .await?;
        let text = response.text().await?;
        let parsed: ProcessResponse = serde_json::from_str(&text)?;
        debug!(
            "Backend processed {} resumes ({} categories)",
            parsed.results.len(),
            parsed.categorized_results.len()
        );
        Ok(parsed)
    }

    async fn download_csv(&self, rows: &[MergedRecord]) -> Result<Bytes, BackendError> {
        self.post_json_for_bytes(
            "download_csv",
            &ExportRequest {
                summarized_data: rows,
            },
        )
        .await
    }

    async fn download_filtered_csv(
        &self,
        rows: &[MergedRecord],
        categories: &[String],
        percentage_threshold: f64,
    ) -> Result<Bytes, BackendError> {
        self.post_json_for_bytes(
            "download_filtered_csv",
            &FilteredExportRequest {
                summarized_data: rows,
                categories,
                percentage_threshold,
            },
        )
        .await
    }

    async fn generate_jd(&self, job_role: &str) -> Result<String, BackendError> {
        let response = self
            .send(
                self.client
                    .post(self.url("generate_jd"))
                    .json(&GenerateJdRequest { job_role }),
            )
            .await?;
        let body: GenerateJdResponse = response.json().await?;
        body.job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or(BackendError::EmptyContent)
    }

    async fn shortlist(
        &self,
        rows: &[MergedRecord],
        percentage_threshold: f64,
        categories: &[String],
    ) -> Result<String, BackendError> {
        let response = self
            .send(
                self.client
                    .post(self.url("shortlist_resumes"))
                    .json(&ShortlistRequest {
                        summarized_data: rows,
                        percentage_threshold,
                        categories,
                    }),
            )
            .await?;
        let body: ShortlistResponse = response.json().await?;
        body.message.ok_or(BackendError::EmptyContent)
    }
}

/// Pulls the `error` string out of a backend error body, if it has one.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}
