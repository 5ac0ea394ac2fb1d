//! Casting raw occurrences to their declared column types.

use crate::data::record::*;
use crate::error::CastError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of an occurrence column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Opaque identifier; must be present.
    Identifier,
    Float,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Identifier => write!(f, "identifier"),
            ColumnType::Float => write!(f, "float64"),
            ColumnType::Text => write!(f, "utf8"),
        }
    }
}

/// Cast every raw row. Order is preserved and no row is dropped; the first
/// value that cannot be cast aborts the whole batch.
pub fn cast_columns(rows: &[RawOccurrence]) -> Result<Vec<TypedOccurrence>, CastError> {
    rows.iter()
        .enumerate()
        .map(|(i, raw)| cast_row(i, raw))
        .collect()
}

/// Cast a single row; `row` is only used for error reporting.
pub fn cast_row(row: usize, raw: &RawOccurrence) -> Result<TypedOccurrence, CastError> {
    let float = |field: &str| {
        cast_float(raw.field(field)).map_err(|v| cast_error(row, field, ColumnType::Float, v))
    };
    let text = |field: &str| cast_text(raw.field(field));

    Ok(TypedOccurrence {
        occurrence_id: cast_identifier(raw.field(OCCURRENCE_ID))
            .map_err(|v| cast_error(row, OCCURRENCE_ID, ColumnType::Identifier, v))?,
        reported_timestamp: float(REPORTED_TIMESTAMP)?,
        arrival_timestamp: float(ARRIVAL_TIMESTAMP)?,
        resolved_timestamp: float(RESOLVED_TIMESTAMP)?,
        latitude: float(LATITUDE)?,
        longitude: float(LONGITUDE)?,
        priority: text(PRIORITY),
        occurrence_category: text(OCCURRENCE_CATEGORY),
        occurrence_subcategory: text(OCCURRENCE_SUBCATEGORY),
        applicant_role: text(APPLICANT_ROLE),
    })
}

fn cast_error(row: usize, field: &str, expected: ColumnType, value: &Value) -> CastError {
    CastError {
        row,
        field: field.to_string(),
        expected,
        raw_value: value.to_string(),
    }
}

/// Numbers pass through, strings are parsed, null stays null.
fn cast_float(value: &Value) -> Result<Option<f64>, &Value> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or(value),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| value),
        _ => Err(value),
    }
}

/// Any value coerces to text; null stays null.
fn cast_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn cast_identifier(value: &Value) -> Result<String, &Value> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(value),
    }
}
