//! # sigo-etl-core
//!
//! Extract-transform-load for SIGO occurrence reports. Pulls raw occurrences
//! from the SIGO backend, casts them to a fixed typed schema and writes a star
//! schema (`dim_categoria`, `dim_applicant_role`, `fato_ocorrencia`) as CSV,
//! plus the per-category and per-priority counts the dashboard charts read.

pub mod config;
pub mod data;
pub mod error;
pub mod persistence;
pub mod pipeline;

pub use config::{EtlConfig, OutputConfig, SourceConfig, load_config};
pub use data::{
    HttpOccurrenceSource, JsonFileOccurrenceSource, OccurrenceSource, StarSchema,
    build_dimensional_model, cast_columns, fetch_occurrences, write_star_schema,
};
pub use error::{CastError, ConfigError, EtlError, Stage};
pub use pipeline::{Pipeline, RunReport, run_pipeline};
