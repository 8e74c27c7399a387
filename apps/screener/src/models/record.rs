use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Implicit category for records that carry no labels.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Sentinel written into merged exports when a field was not produced.
pub const NOT_AVAILABLE: &str = "N/A";

/// Which backend operation produced a batch. Drives which fields are shown
/// and whether percentage filtering and sorting apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningMode {
    #[default]
    Summarize,
    Match,
}

impl ScreeningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningMode::Summarize => "summarize",
            ScreeningMode::Match => "match",
        }
    }
}

/// One resume's processed result as returned by the backend.
///
/// Only the fields the screening pipeline interprets are typed. Everything
/// else (name, email, skills, evaluation, ...) stays in `details` and is
/// serialized back out untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: String,
    #[serde(
        default,
        deserialize_with = "lenient_labels",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub percentage_match: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub justification: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub lacking: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Record {
    /// Labels this record belongs to, with the implicit `Uncategorized`
    /// standing in for an empty list.
    pub fn effective_categories(&self) -> Vec<&str> {
        if self.categories.is_empty() {
            vec![UNCATEGORIZED]
        } else {
            self.categories.iter().map(String::as_str).collect()
        }
    }

    /// True when the record belongs to `category`, counting an unlabeled
    /// record as `Uncategorized`.
    pub fn in_category(&self, category: &str) -> bool {
        if self.categories.is_empty() {
            category == UNCATEGORIZED
        } else {
            self.categories.iter().any(|c| c == category)
        }
    }

    /// True when the record belongs to at least one of `categories`.
    pub fn in_any_category(&self, categories: &[String]) -> bool {
        categories.iter().any(|c| self.in_category(c))
    }

    /// Reads an opaque payload field as display text.
    /// Missing, null and empty values all read as `None`.
    pub fn detail(&self, key: &str) -> Option<String> {
        match self.details.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A record prepared for CSV export: summarize fields plus the match fields
/// joined from the match batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedRecord(pub Record);

impl MergedRecord {
    pub fn record(&self) -> &Record {
        &self.0
    }
}

impl From<Record> for MergedRecord {
    fn from(record: Record) -> Self {
        MergedRecord(record)
    }
}

/// Body returned by the backend's process endpoint.
///
/// Current backends answer with an object carrying the flat results and a
/// category index; older ones answer with the bare results array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ProcessResponseWire")]
pub struct ProcessResponse {
    pub results: Vec<Record>,
    pub categorized_results: BTreeMap<String, Vec<Record>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProcessResponseWire {
    Bare(Vec<Record>),
    Full {
        #[serde(default, deserialize_with = "nullable")]
        results: Vec<Record>,
        #[serde(default, deserialize_with = "nullable")]
        categorized_results: BTreeMap<String, Vec<Record>>,
    },
}

impl From<ProcessResponseWire> for ProcessResponse {
    fn from(wire: ProcessResponseWire) -> Self {
        match wire {
            ProcessResponseWire::Bare(results) => ProcessResponse {
                results,
                categorized_results: BTreeMap::new(),
            },
            ProcessResponseWire::Full {
                results,
                categorized_results,
            } => ProcessResponse {
                results,
                categorized_results,
            },
        }
    }
}

// Backend records are loosely typed. A malformed field falls back to its
// default instead of failing the whole batch.

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scalar as text: strings as-is, numbers and booleans in their JSON form.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Accepts a list of labels or a single bare label. Blank and non-scalar
/// entries are dropped.
fn lenient_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        other => vec![other],
    };
    Ok(items
        .into_iter()
        .filter_map(scalar_text)
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect())
}
