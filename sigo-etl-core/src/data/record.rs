//! Occurrence records before and after typing.

use serde::{Deserialize, Serialize};

pub const OCCURRENCE_ID: &str = "occurrence_id";
pub const REPORTED_TIMESTAMP: &str = "reported_timestamp";
pub const ARRIVAL_TIMESTAMP: &str = "arrival_timestamp";
pub const RESOLVED_TIMESTAMP: &str = "resolved_timestamp";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const PRIORITY: &str = "priority";
pub const OCCURRENCE_CATEGORY: &str = "occurrence_category";
pub const OCCURRENCE_SUBCATEGORY: &str = "occurrence_subcategory";
pub const APPLICANT_ROLE: &str = "applicant_role";

/// An untyped occurrence as returned by the backend.
///
/// Fields are kept as raw JSON until the transform casts them. Fields other
/// than the ten known ones are carried along but never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOccurrence(serde_json::Map<String, serde_json::Value>);

impl RawOccurrence {
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }

    /// Raw value of a field; missing fields read as `null`.
    pub fn field(&self, name: &str) -> &serde_json::Value {
        static NULL: serde_json::Value = serde_json::Value::Null;
        self.0.get(name).unwrap_or(&NULL)
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawOccurrence {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }
}

/// An occurrence with every known field cast to its declared type.
///
/// `None` stands for a null cell: the field was missing or `null` upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedOccurrence {
    pub occurrence_id: String,
    pub reported_timestamp: Option<f64>,
    pub arrival_timestamp: Option<f64>,
    pub resolved_timestamp: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub priority: Option<String>,
    pub occurrence_category: Option<String>,
    pub occurrence_subcategory: Option<String>,
    pub applicant_role: Option<String>,
}
