//! Occurrence data pipeline: extraction, typing, dimensional modelling, persistence.

pub mod model;
pub mod record;
pub mod source;
pub mod storage;
pub mod summary;
pub mod transform;

pub use model::{
    ApplicantRoleDimension, CategoryDimension, CategoryKey, Dimension, OccurrenceFact, RoleKey,
    StarSchema, SurrogateKey, build_dimensional_model,
};
pub use record::{RawOccurrence, TypedOccurrence};
pub use source::{
    HttpOccurrenceSource, JsonFileOccurrenceSource, OccurrenceSource, SourceInfo,
    fetch_occurrences, parse_occurrences,
};
pub use storage::{WrittenFiles, write_star_schema};
pub use summary::{OccurrenceSummary, summarize};
pub use transform::{ColumnType, cast_columns};
