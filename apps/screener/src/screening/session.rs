//! The screening session: both record batches, the backend's category
//! index, the live filter criteria and the staged upload set.
//!
//! One session lives for the lifetime of the process. It is owned by
//! `AppState` and handed by reference to the engine and aggregator, which
//! never read ambient state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::record::{MergedRecord, ProcessResponse, Record, ScreeningMode};
use crate::screening::aggregate::{chart_data, ChartData};
use crate::screening::filter::{filter_and_sort, select_rows, FilterCriteria};
use crate::screening::merge::merge_for_export;
use crate::screening::render::{describe_filters, render_results};
use crate::screening::uploads::{
    estimate_processing, is_supported, ProcessingEstimate, StagedFile, StagedFileSummary,
};

/// Records returned by one submission.
#[derive(Debug, Clone)]
pub struct Batch {
    pub records: Vec<Record>,
    pub received_at: DateTime<Utc>,
}

/// What a staging request did with the files it carried.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageOutcome {
    pub accepted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Snapshot the results endpoints return to the page.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub session_id: Uuid,
    pub mode: ScreeningMode,
    pub criteria: FilterCriteria,
    pub applied_filters: String,
    pub available_categories: Vec<String>,
    pub total: usize,
    pub visible: usize,
    pub records: Vec<Record>,
    pub html: String,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ScreeningSession {
    id: Uuid,
    summarized: Option<Batch>,
    matched: Option<Batch>,
    categorized: BTreeMap<String, Vec<Record>>,
    criteria: FilterCriteria,
    staged: Vec<StagedFile>,
}

impl Default for ScreeningSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreeningSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            summarized: None,
            matched: None,
            categorized: BTreeMap::new(),
            criteria: FilterCriteria::new(ScreeningMode::Summarize, 0.0, None),
            staged: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        &mut self.criteria
    }

    // ── uploads ────────────────────────────────────────────────────────────

    /// Stages resume files. With `append` the new files join the staged set,
    /// otherwise they replace it. Unsupported file types are skipped.
    pub fn stage_files(&mut self, files: Vec<StagedFile>, append: bool) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        let mut accepted = Vec::with_capacity(files.len());

        for file in files {
            if is_supported(&file.filename) {
                outcome.accepted.push(file.filename.clone());
                accepted.push(file);
            } else {
                outcome.skipped.push(file.filename);
            }
        }

        if !append {
            self.staged.clear();
        }
        self.staged.extend(accepted);
        outcome
    }

    pub fn remove_staged(&mut self, index: usize) -> Option<StagedFile> {
        if index < self.staged.len() {
            Some(self.staged.remove(index))
        } else {
            None
        }
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn staged_summaries(&self) -> Vec<StagedFileSummary> {
        self.staged
            .iter()
            .enumerate()
            .map(|(index, file)| StagedFileSummary {
                index,
                filename: file.filename.clone(),
                size_kb: file.size_kb(),
            })
            .collect()
    }

    pub fn processing_estimate(&self, mode: ScreeningMode) -> ProcessingEstimate {
        estimate_processing(mode, self.staged.len())
    }

    // ── batches ────────────────────────────────────────────────────────────

    /// Stores a fresh batch for `mode`, replacing only that mode's previous
    /// batch, and makes `mode` the displayed one.
    pub fn apply_results(&mut self, mode: ScreeningMode, response: ProcessResponse) {
        let batch = Batch {
            records: response.results,
            received_at: Utc::now(),
        };
        match mode {
            ScreeningMode::Summarize => self.summarized = Some(batch),
            ScreeningMode::Match => self.matched = Some(batch),
        }
        self.categorized = response.categorized_results;
        self.criteria.mode = mode;
    }

    pub fn batch(&self, mode: ScreeningMode) -> &[Record] {
        let batch = match mode {
            ScreeningMode::Summarize => self.summarized.as_ref(),
            ScreeningMode::Match => self.matched.as_ref(),
        };
        batch.map(|b| b.records.as_slice()).unwrap_or_default()
    }

    pub fn has_results(&self) -> bool {
        self.summarized.is_some() || self.matched.is_some()
    }

    /// Category buttons offered by the page, from the backend's index.
    pub fn available_categories(&self) -> Vec<String> {
        self.categorized.keys().cloned().collect()
    }

    pub fn visible(&self) -> Vec<&Record> {
        filter_and_sort(self.batch(self.criteria.mode), &self.criteria)
    }

    pub fn view(&self) -> ResultsView {
        let active = self.batch(self.criteria.mode);
        let visible = self.visible();
        let received_at = match self.criteria.mode {
            ScreeningMode::Summarize => self.summarized.as_ref(),
            ScreeningMode::Match => self.matched.as_ref(),
        }
        .map(|b| b.received_at);

        ResultsView {
            session_id: self.id,
            mode: self.criteria.mode,
            criteria: self.criteria.clone(),
            applied_filters: describe_filters(&self.criteria),
            available_categories: self.available_categories(),
            total: active.len(),
            visible: visible.len(),
            html: render_results(&visible, &self.criteria),
            records: visible.into_iter().cloned().collect(),
            received_at,
        }
    }

    pub fn charts(&self) -> ChartData {
        chart_data(self.batch(self.criteria.mode), &self.criteria)
    }

    // ── exports ────────────────────────────────────────────────────────────

    pub fn export_rows(&self) -> Vec<MergedRecord> {
        merge_for_export(
            self.batch(ScreeningMode::Summarize),
            self.batch(ScreeningMode::Match),
        )
    }

    /// Rows for the per-category CSV: merged rows in any of `categories`,
    /// falling back to the match batch when none qualify.
    pub fn filtered_export_rows(&self, categories: &[String]) -> Vec<MergedRecord> {
        let selected = select_rows(&self.export_rows(), 0.0, categories);
        if !selected.is_empty() {
            return selected;
        }
        let matched: Vec<MergedRecord> = self
            .batch(ScreeningMode::Match)
            .iter()
            .cloned()
            .map(MergedRecord::from)
            .collect();
        select_rows(&matched, 0.0, categories)
    }

    pub fn shortlist_rows(&self, threshold: f64, categories: &[String]) -> Vec<MergedRecord> {
        select_rows(&self.export_rows(), threshold, categories)
    }
}
