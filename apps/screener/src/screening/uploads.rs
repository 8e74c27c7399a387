use bytes::Bytes;
use serde::Serialize;

use crate::models::record::ScreeningMode;

/// File types the backend can read resumes from.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = [".pdf", ".docx", ".txt", ".png", ".jpg", ".jpeg"];

const SUMMARIZE_SECS_PER_RESUME: u64 = 5;
const MATCH_SECS_PER_RESUME: u64 = 4;

/// A resume file held in memory until the next process request.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl StagedFile {
    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.bytes.len() as f64 / 1024.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedFileSummary {
    pub index: usize,
    pub filename: String,
    pub size_kb: String,
}

/// Rough wall-clock estimate the page shows while a batch is processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingEstimate {
    pub seconds: u64,
    pub label: String,
}

pub fn is_supported(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn estimate_processing(mode: ScreeningMode, resumes: usize) -> ProcessingEstimate {
    let per_resume = match mode {
        ScreeningMode::Summarize => SUMMARIZE_SECS_PER_RESUME,
        ScreeningMode::Match => MATCH_SECS_PER_RESUME,
    };
    let seconds = per_resume * resumes as u64;
    ProcessingEstimate {
        seconds,
        label: duration_label(seconds),
    }
}

fn duration_label(total: u64) -> String {
    let minutes = total / 60;
    let seconds = total % 60;
    format!(
        "{minutes} minute{} {seconds} second{}",
        plural(minutes),
        plural(seconds)
    )
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
