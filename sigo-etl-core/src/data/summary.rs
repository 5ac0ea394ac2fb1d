//! Occurrence counts served to the dashboard charts.
//!
//! Category counts feed the doughnut chart, priority counts the pie chart.

use crate::config::OutputConfig;
use crate::data::model::StarSchema;
use crate::error::EtlError;
use crate::persistence::atomic_write_json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const SUMMARY_FILE: &str = "dashboard_data.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    /// Null or unrecognised priorities.
    pub other: usize,
}

impl PriorityBreakdown {
    fn record(&mut self, priority: Option<&str>) {
        match priority.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("low") => self.low += 1,
            Some("medium") => self.medium += 1,
            Some("high") => self.high += 1,
            _ => self.other += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    pub total: usize,
    /// Sorted by count descending, then category name.
    pub by_category: Vec<CategoryCount>,
    pub by_priority: PriorityBreakdown,
    /// Facts whose category is null or did not resolve.
    pub uncategorized: usize,
}

/// Count facts per top-level category and per priority.
pub fn summarize(model: &StarSchema) -> OccurrenceSummary {
    let mut per_category: HashMap<&str, usize> = HashMap::new();
    let mut summary = OccurrenceSummary::default();

    for resolved in model.resolved() {
        summary.total += 1;
        summary.by_priority.record(resolved.fact.priority.as_deref());
        match resolved
            .category
            .and_then(|c| c.occurrence_category.as_deref())
        {
            Some(category) => *per_category.entry(category).or_default() += 1,
            None => summary.uncategorized += 1,
        }
    }

    let mut by_category: Vec<CategoryCount> = per_category
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    summary.by_category = by_category;
    summary
}

/// Write the category counts as `dashboard_data.json` in the output directory.
///
/// The file is a top-level `[{category, count}]` array, the shape the
/// dashboard doughnut chart maps over. Totals and the priority breakdown
/// stay in the run report.
pub fn write_summary(
    summary: &OccurrenceSummary,
    output: &OutputConfig,
) -> Result<PathBuf, EtlError> {
    let path = output.dir.join(SUMMARY_FILE);
    atomic_write_json(&path, &summary.by_category).map_err(|e| EtlError::write(&path, e))?;
    Ok(path)
}
