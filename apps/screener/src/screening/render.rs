//! HTML fragments for the results panel.
//!
//! Every value coming from the backend is escaped before it is placed in
//! markup; the only raw markup is the `<br>` used to join list entries.

use std::fmt::Write as _;

use crate::models::record::{Record, ScreeningMode, NOT_AVAILABLE};
use crate::screening::filter::FilterCriteria;

const EMPTY_STATE: &str = "No results found for the selected filters.";

/// Characters stripped from LLM-formatted list entries.
const NOISE_CHARS: [char; 5] = ['*', '[', ']', '"', ':'];

/// Human summary of the active filters, e.g.
/// `Percentage Match >= 60%, Category: Backend`.
pub fn describe_filters(criteria: &FilterCriteria) -> String {
    let mut parts = Vec::new();
    if criteria.threshold_applies() {
        parts.push(format!("Percentage Match >= {}%", criteria.min_percentage));
    }
    if let Some(category) = criteria.category.as_deref() {
        parts.push(format!("Category: {category}"));
    }
    if parts.is_empty() {
        "None".to_string()
    } else {
        parts.join(", ")
    }
}

/// Renders the whole results panel for the visible records.
pub fn render_results(records: &[&Record], criteria: &FilterCriteria) -> String {
    let mut out = String::from("<h2>Results</h2>");
    let _ = write!(
        out,
        "<p><strong>Applied Filters:</strong> {}</p>",
        escape_html(&describe_filters(criteria))
    );

    if records.is_empty() {
        let _ = write!(out, "<p>{EMPTY_STATE}</p>");
        return out;
    }

    out.push_str(r#"<ul class="list-group">"#);
    for record in records {
        out.push_str(&render_record(record, criteria.mode));
    }
    out.push_str("</ul>");
    out
}

fn render_record(record: &Record, mode: ScreeningMode) -> String {
    let mut out = String::from(
        r#"<li class="list-group-item"><div class="result-grid">"#,
    );

    let filename = non_empty(Some(record.filename.as_str())).map(str::to_string);
    let categories = if record.categories.is_empty() {
        None
    } else {
        Some(record.categories.join(", "))
    };

    push_text(&mut out, "Filename", filename);
    push_text(&mut out, "Categories", categories);
    push_text(&mut out, "Specific Role", record.detail("specific_role"));

    match mode {
        ScreeningMode::Summarize => {
            push_text(&mut out, "Name", record.detail("name"));
            push_text(&mut out, "Email", record.detail("email"));
            push_text(&mut out, "Phone", record.detail("phone"));
            push_text(&mut out, "Qualification", record.detail("qualification"));
            push_markup(
                &mut out,
                "Experience",
                &format_experience(record.detail("experience").as_deref()),
            );
            push_text(&mut out, "Skills", record.detail("skills"));
            push_text(&mut out, "Evaluation", record.detail("evaluation"));
            push_text(&mut out, "Personality", record.detail("personal_evaluation"));
        }
        ScreeningMode::Match => {
            push_text(&mut out, "Percentage Match", record.percentage_match.clone());
            push_text(&mut out, "Justification", record.justification.clone());
            push_markup(
                &mut out,
                "Lacking",
                &format_lacking(record.lacking.as_deref()),
            );
        }
    }

    out.push_str("</div></li>");
    out
}

fn push_text(out: &mut String, label: &str, value: Option<String>) {
    let value = value
        .as_deref()
        .and_then(|v| non_empty(Some(v)))
        .map(escape_html)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let _ = write!(out, "<strong>{label}:</strong> <span>{value}</span>");
}

fn push_markup(out: &mut String, label: &str, markup: &str) {
    let _ = write!(out, "<strong>{label}:</strong> <div>{markup}</div>");
}

/// Formats a free-text experience field into one line per position.
///
/// Entries are split on `"(n -"`, then `" - "`, then newlines. An entry with
/// at least three comma-separated parts is read as company, role, duration.
pub fn format_experience(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty() && *t != NOT_AVAILABLE) else {
        return NOT_AVAILABLE.to_string();
    };

    let entries: Vec<&str> = if text.contains("(n -") {
        text.split("(n -").collect()
    } else if text.contains(" - ") {
        text.split(" - ").filter(|e| !e.trim().is_empty()).collect()
    } else {
        text.lines().filter(|e| !e.trim().is_empty()).collect()
    };

    entries
        .into_iter()
        .map(|entry| {
            let clean = strip_noise(entry);
            let parts: Vec<&str> = clean.split(", ").map(str::trim).collect();
            let line = if parts.len() >= 3 {
                format!("{} - {}, {}", parts[0], parts[1], parts[2..].join(", "))
            } else {
                clean
            };
            escape_html(&line)
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Formats the "lacking" field as a renumbered list.
///
/// Splits on newlines when present, otherwise before each `N. ` enumerator.
/// Existing enumerators are dropped so items are not numbered twice; an item
/// that cleans to nothing is shown as `Item k`.
pub fn format_lacking(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty() && *t != NOT_AVAILABLE) else {
        return NOT_AVAILABLE.to_string();
    };

    let items: Vec<&str> = if text.contains('\n') {
        text.split('\n').collect()
    } else {
        split_before_enumerators(text)
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect()
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let clean = strip_enumerator(&strip_noise(item)).to_string();
            let clean = if clean.is_empty() {
                format!("Item {}", index + 1)
            } else {
                clean
            };
            format!("{}. {}", index + 1, escape_html(&clean))
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn strip_noise(text: &str) -> String {
    text.chars()
        .filter(|c| !NOISE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Splits `text` right before each `N. ` enumerator that is not at the start.
fn split_before_enumerators(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let cuts: Vec<usize> = (1..bytes.len())
        .filter(|&i| bytes[i].is_ascii_digit() && !bytes[i - 1].is_ascii_digit())
        .filter(|&i| enumerator_len(&text[i..]).is_some())
        .collect();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(&text[start..cut]);
        start = cut;
    }
    pieces.push(&text[start..]);
    pieces
}

/// Length of a leading `digits "." whitespace` enumerator, if present.
fn enumerator_len(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &text[digits..];
    let after_dot = rest.strip_prefix('.')?;
    let ws = after_dot.len() - after_dot.trim_start().len();
    if ws == 0 {
        return None;
    }
    Some(digits + 1 + ws)
}

fn strip_enumerator(text: &str) -> &str {
    match enumerator_len(text) {
        Some(len) => text[len..].trim(),
        None => text,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
