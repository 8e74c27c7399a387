use std::collections::HashMap;

use crate::models::record::{MergedRecord, Record, NOT_AVAILABLE};

/// Joins the summarize batch with the match batch by `filename` for export.
///
/// Each summarized record takes `percentage_match`, `justification` and
/// `lacking` from the first matched record with the same filename; missing or
/// empty values become `"N/A"`. With no summarize batch the match batch is
/// exported unchanged.
pub fn merge_for_export(summarized: &[Record], matched: &[Record]) -> Vec<MergedRecord> {
    if summarized.is_empty() {
        return matched.iter().cloned().map(MergedRecord::from).collect();
    }

    let mut by_filename: HashMap<&str, &Record> = HashMap::with_capacity(matched.len());
    for record in matched {
        // first occurrence wins on duplicate filenames
        by_filename.entry(record.filename.as_str()).or_insert(record);
    }

    summarized
        .iter()
        .map(|summary| {
            let found = by_filename.get(summary.filename.as_str()).copied();
            let mut merged = summary.clone();
            merged.percentage_match = Some(or_not_available(found, |m| &m.percentage_match));
            merged.justification = Some(or_not_available(found, |m| &m.justification));
            merged.lacking = Some(or_not_available(found, |m| &m.lacking));
            MergedRecord(merged)
        })
        .collect()
}

fn or_not_available(found: Option<&Record>, field: impl Fn(&Record) -> &Option<String>) -> String {
    found
        .and_then(|m| field(m).as_deref())
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}
