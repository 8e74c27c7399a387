//! Category aggregation and the chart datasets derived from it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::record::{Record, ScreeningMode};
use crate::screening::filter::{record_percentage, FilterCriteria};

/// Label shown by both charts when there is nothing to plot.
pub const NO_DATA_LABEL: &str = "No Data";

/// Slice colours for the pie chart, cycled by the page.
pub const PIE_PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#C9CBCF", "#7BC043",
    "#F4A261", "#E76F51",
];

const BAR_COLOR: &str = "#36A2EB";

/// Category → number of records carrying it.
///
/// Membership is non-exclusive: a record listing three categories counts once
/// in each, so `total()` can exceed the number of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounts(BTreeMap<String, usize>);

impl CategoryCounts {
    pub fn get(&self, category: &str) -> usize {
        self.0.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Share of `category` in the total, in percent. 0 when the total is 0.
    pub fn percentage(&self, category: &str) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        100.0 * self.get(category) as f64 / total as f64
    }

    /// Keeps only `category`, for views scoped to one selected category.
    pub fn restrict_to(&self, category: &str) -> CategoryCounts {
        let mut scoped = BTreeMap::new();
        scoped.insert(category.to_string(), self.get(category));
        CategoryCounts(scoped)
    }
}

/// Counts records per category, with unlabeled records under
/// `Uncategorized`.
pub fn aggregate<'a, I>(records: I) -> CategoryCounts
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        for category in record.effective_categories() {
            *counts.entry(category.to_string()).or_insert(0) += 1;
        }
    }
    CategoryCounts(counts)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: &'static str,
    pub labels: Vec<String>,
    /// Percent of total per label, rounded to one decimal.
    pub data: Vec<f64>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: &'static str,
    pub dataset_label: &'static str,
    pub labels: Vec<String>,
    pub data: Vec<usize>,
    pub color: &'static str,
}

/// Both chart datasets for one render, plus whether the panel has anything
/// worth showing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub pie: PieChart,
    pub bar: BarChart,
    pub visible: bool,
}

/// Builds chart datasets for `records` under the current criteria.
///
/// In match mode the percentage threshold is applied before counting; a
/// selected category narrows both datasets to that single category.
pub fn chart_data(records: &[Record], criteria: &FilterCriteria) -> ChartData {
    let counted: Vec<&Record> = if criteria.mode == ScreeningMode::Match {
        records
            .iter()
            .filter(|r| record_percentage(r) >= criteria.min_percentage)
            .collect()
    } else {
        records.iter().collect()
    };

    let mut counts = aggregate(counted);
    if let Some(category) = criteria.category.as_deref() {
        counts = counts.restrict_to(category);
    }

    build_charts(&counts)
}

fn build_charts(counts: &CategoryCounts) -> ChartData {
    let total = counts.total();

    let (labels, percentages, bars) = if counts.is_empty() {
        (vec![NO_DATA_LABEL.to_string()], vec![1.0], vec![0])
    } else {
        let labels: Vec<String> = counts.iter().map(|(c, _)| c.to_string()).collect();
        let percentages: Vec<f64> = counts
            .iter()
            .map(|(c, _)| round_one_decimal(counts.percentage(c)))
            .collect();
        let bars: Vec<usize> = counts.iter().map(|(_, n)| n).collect();
        (labels, percentages, bars)
    };

    ChartData {
        pie: PieChart {
            title: "Percentage Distribution by Category",
            labels: labels.clone(),
            data: percentages,
            colors: PIE_PALETTE.to_vec(),
        },
        bar: BarChart {
            title: "Count of Resumes by Category",
            dataset_label: "Number of Resumes",
            labels,
            data: bars,
            color: BAR_COLOR,
        },
        visible: total > 0,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
