//! Result filter/sort engine.
//!
//! Pipeline order is fixed: percentage threshold, then category, then the
//! match-mode sort. Malformed percentages read as 0 and are never dropped
//! for being malformed.

use serde::{Deserialize, Serialize};

use crate::models::record::{MergedRecord, Record, ScreeningMode};

/// Live, UI-driven filter state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// 0 means no threshold.
    pub min_percentage: f64,
    pub category: Option<String>,
    pub mode: ScreeningMode,
}

impl FilterCriteria {
    pub fn new(mode: ScreeningMode, min_percentage: f64, category: Option<String>) -> Self {
        Self {
            min_percentage: sanitize_threshold(min_percentage),
            category: normalize_category(category),
            mode,
        }
    }

    pub fn set_min_percentage(&mut self, value: f64) {
        self.min_percentage = sanitize_threshold(value);
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = normalize_category(category);
    }

    /// True when the percentage threshold takes part in filtering.
    pub fn threshold_applies(&self) -> bool {
        self.mode == ScreeningMode::Match && self.min_percentage > 0.0
    }
}

/// Parses a backend percentage string such as `"72%"` or `"72.5 %"`.
///
/// Reads the leading decimal number after trimming; a `%` or any trailing
/// text is ignored. Missing, `"N/A"`, non-numeric or non-finite values yield
/// 0.
pub fn parse_percentage(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let text = raw.trim();
    let end = numeric_prefix_len(text);
    if end == 0 {
        return 0.0;
    }
    match text[..end].parse::<f64>() {
        // adding 0.0 turns -0.0 into 0.0 so it ties with other zeros
        Ok(value) if value.is_finite() => value + 0.0,
        _ => 0.0,
    }
}

/// Percentage of a record, with the same defaulting as [`parse_percentage`].
pub fn record_percentage(record: &Record) -> f64 {
    parse_percentage(record.percentage_match.as_deref())
}

/// Produces the visible subset of `records` in display order.
pub fn filter_and_sort<'a>(records: &'a [Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    let mut visible: Vec<&Record> = records.iter().collect();

    if criteria.threshold_applies() {
        visible.retain(|r| record_percentage(r) >= criteria.min_percentage);
    }

    if let Some(category) = criteria.category.as_deref() {
        visible.retain(|r| r.in_category(category));
    }

    if criteria.mode == ScreeningMode::Match {
        sort_by_percentage(&mut visible);
    }

    visible
}

/// Stable descending sort by parsed percentage; ties keep input order.
pub fn sort_by_percentage(records: &mut [&Record]) {
    records.sort_by(|a, b| record_percentage(b).total_cmp(&record_percentage(a)));
}

/// Selects export rows for the shortlist and filtered-CSV actions.
///
/// A row passes when its percentage reaches `threshold` and, if any
/// categories are selected, it belongs to at least one of them.
pub fn select_rows(
    rows: &[MergedRecord],
    threshold: f64,
    categories: &[String],
) -> Vec<MergedRecord> {
    let threshold = sanitize_threshold(threshold);
    rows.iter()
        .filter(|row| record_percentage(row.record()) >= threshold)
        .filter(|row| categories.is_empty() || row.record().in_any_category(categories))
        .cloned()
        .collect()
}

fn sanitize_threshold(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Length of the longest prefix of `text` that reads as a decimal number:
/// optional sign, digits with at most one dot, optional exponent.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }

    if digits == 0 {
        return 0;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
