//! Test double for [`ResumeBackend`]: canned answers, recorded calls.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{BackendError, ResumeBackend};
use crate::models::record::{MergedRecord, ProcessResponse, ScreeningMode};
use crate::screening::uploads::StagedFile;

#[derive(Debug, Clone, PartialEq)]
pub enum StubCall {
    Process {
        mode: ScreeningMode,
        filenames: Vec<String>,
        job_description: Option<String>,
    },
    Csv {
        rows: usize,
    },
    FilteredCsv {
        rows: usize,
        categories: Vec<String>,
        threshold: f64,
    },
    GenerateJd {
        role: String,
    },
    Shortlist {
        filenames: Vec<String>,
        threshold: f64,
        categories: Vec<String>,
    },
}

#[derive(Default)]
pub struct StubBackend {
    pub process_response: Mutex<Option<ProcessResponse>>,
    pub fail_with: Mutex<Option<String>>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<StubCall>>,
}

impl StubBackend {
    pub fn returning(response: ProcessResponse) -> Self {
        Self {
            process_response: Mutex::new(Some(response)),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Mutex::new(Some(message.to_string())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn step(&self, call: StubCall) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(BackendError::Api {
                status: 500,
                message: Some(message),
            }),
            None => Ok(()),
        }
    }
}

fn filenames(rows: &[MergedRecord]) -> Vec<String> {
    rows.iter().map(|r| r.record().filename.clone()).collect()
}

#[async_trait]
impl ResumeBackend for StubBackend {
    async fn process_resumes(
        &self,
        files: Vec<StagedFile>,
        mode: ScreeningMode,
        job_description: Option<String>,
    ) -> Result<ProcessResponse, BackendError> {
        self.step(StubCall::Process {
            mode,
            filenames: files.into_iter().map(|f| f.filename).collect(),
            job_description,
        })
        .await?;
        Ok(self
            .process_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn download_csv(&self, rows: &[MergedRecord]) -> Result<Bytes, BackendError> {
        self.step(StubCall::Csv { rows: rows.len() }).await?;
        Ok(Bytes::from(format!("filename\n{}\n", filenames(rows).join("\n"))))
    }

    async fn download_filtered_csv(
        &self,
        rows: &[MergedRecord],
        categories: &[String],
        percentage_threshold: f64,
    ) -> Result<Bytes, BackendError> {
        self.step(StubCall::FilteredCsv {
            rows: rows.len(),
            categories: categories.to_vec(),
            threshold: percentage_threshold,
        })
        .await?;
        Ok(Bytes::from_static(b"filename\n"))
    }

    async fn generate_jd(&self, job_role: &str) -> Result<String, BackendError> {
        self.step(StubCall::GenerateJd {
            role: job_role.to_string(),
        })
        .await?;
        Ok(format!("We are hiring a {job_role}."))
    }

    async fn shortlist(
        &self,
        rows: &[MergedRecord],
        percentage_threshold: f64,
        categories: &[String],
    ) -> Result<String, BackendError> {
        self.step(StubCall::Shortlist {
            filenames: filenames(rows),
            threshold: percentage_threshold,
            categories: categories.to_vec(),
        })
        .await?;
        Ok(format!("{} resumes shortlisted", rows.len()))
    }
}
