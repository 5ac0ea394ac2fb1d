//! Pipeline driver: extract -> transform -> load, end to end, no retries.
//!
//! Nothing is written unless fetch, cast and model building all succeeded.

use crate::config::{EtlConfig, OutputConfig};
use crate::data::model::build_dimensional_model;
use crate::data::source::{HttpOccurrenceSource, OccurrenceSource, SourceInfo};
use crate::data::storage::{WrittenFiles, write_star_schema};
use crate::data::summary::{OccurrenceSummary, summarize, write_summary};
use crate::data::transform::cast_columns;
use crate::error::EtlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub source: SourceInfo,
    pub rows: usize,
    pub categories: usize,
    pub applicant_roles: usize,
    pub files: WrittenFiles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<OccurrenceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_file: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One ETL run over a source into an output directory.
pub struct Pipeline {
    source: Box<dyn OccurrenceSource>,
    output: OutputConfig,
}

impl Pipeline {
    pub fn new(source: Box<dyn OccurrenceSource>, output: OutputConfig) -> Self {
        Self { source, output }
    }

    /// Run the pipeline. Any stage failure aborts the run with that stage's error.
    pub async fn run(&self) -> Result<RunReport, EtlError> {
        let result = self.execute().await;
        if let Err(e) = &result {
            error!(stage = %e.stage(), error = %e, "ETL run failed");
        }
        result
    }

    async fn execute(&self) -> Result<RunReport, EtlError> {
        let started_at = Utc::now();
        let source = self.source.describe();
        info!(
            source_type = %source.source_type,
            location = %source.location,
            output = %self.output.dir.display(),
            "Starting ETL run"
        );

        let raw = self.source.fetch().await?;
        let typed = cast_columns(&raw)?;
        debug!(rows = typed.len(), "Columns cast");

        let model = build_dimensional_model(&typed);
        debug!(
            categories = model.categories.len(),
            applicant_roles = model.roles.len(),
            facts = model.facts.len(),
            "Dimensional model built"
        );

        let files = write_star_schema(&model, &self.output)?;

        let (summary, summary_file) = if self.output.write_summary {
            let summary = summarize(&model);
            let path = write_summary(&summary, &self.output)?;
            (Some(summary), Some(path))
        } else {
            (None, None)
        };

        let report = RunReport {
            source,
            rows: model.facts.len(),
            categories: model.categories.len(),
            applicant_roles: model.roles.len(),
            files,
            summary,
            summary_file,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            rows = report.rows,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "ETL run completed"
        );
        Ok(report)
    }
}

/// Validate `config`, fetch from the configured endpoint and write the star schema.
pub async fn run_pipeline(config: &EtlConfig) -> Result<RunReport, EtlError> {
    config.validate()?;
    let source = HttpOccurrenceSource::from_config(&config.source)?;
    Pipeline::new(Box::new(source), config.output.clone())
        .run()
        .await
}
