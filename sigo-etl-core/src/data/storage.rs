//! CSV persistence of the star schema.

use crate::config::OutputConfig;
use crate::data::model::{ApplicantRoleDimension, CategoryDimension, OccurrenceFact, StarSchema};
use crate::error::EtlError;
use crate::persistence::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DIM_CATEGORIA_FILE: &str = "dim_categoria.csv";
pub const DIM_APPLICANT_ROLE_FILE: &str = "dim_applicant_role.csv";
pub const FATO_OCORRENCIA_FILE: &str = "fato_ocorrencia.csv";

pub const DIM_CATEGORIA_COLUMNS: &[&str] =
    &["categoria_id", "occurrence_category", "occurrence_subcategory"];
pub const DIM_APPLICANT_ROLE_COLUMNS: &[&str] = &["applicant_role_id", "applicant_role"];
pub const FATO_OCORRENCIA_COLUMNS: &[&str] = &[
    "occurrence_id",
    "categoria_id",
    "applicant_role_id",
    "priority",
    "reported_timestamp",
    "arrival_timestamp",
    "resolved_timestamp",
    "latitude",
    "longitude",
];

/// Paths of the tables written by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenFiles {
    pub dim_categoria: PathBuf,
    pub dim_applicant_role: PathBuf,
    pub fato_ocorrencia: PathBuf,
}

/// A CSV row; `None` renders as an empty cell.
type Cells = Vec<Option<String>>;

/// Render a table as CSV with a header line.
///
/// Fields containing the delimiter, a quote, CR or LF are quoted and inner
/// quotes doubled. Every line ends with `\n`.
pub fn render_csv<I>(columns: &[&str], rows: I, delimiter: char) -> String
where
    I: IntoIterator<Item = Cells>,
{
    let mut out = String::new();
    push_line(
        &mut out,
        columns.iter().map(|c| Some(c.to_string())),
        delimiter,
    );
    for row in rows {
        push_line(&mut out, row, delimiter);
    }
    out
}

fn push_line(out: &mut String, cells: impl IntoIterator<Item = Option<String>>, delimiter: char) {
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        if let Some(value) = cell {
            out.push_str(&escape_csv(&value, delimiter));
        }
    }
    out.push('\n');
}

/// CSV field escaping.
pub fn escape_csv(s: &str, delimiter: char) -> String {
    if s.contains(delimiter) || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn num<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn render_categories(dim: &CategoryDimension, delimiter: char) -> String {
    let rows = dim.iter().map(|(key, member)| {
        vec![
            Some(key.to_string()),
            member.occurrence_category.clone(),
            member.occurrence_subcategory.clone(),
        ]
    });
    render_csv(DIM_CATEGORIA_COLUMNS, rows, delimiter)
}

pub fn render_roles(dim: &ApplicantRoleDimension, delimiter: char) -> String {
    let rows = dim
        .iter()
        .map(|(key, member)| vec![Some(key.to_string()), member.applicant_role.clone()]);
    render_csv(DIM_APPLICANT_ROLE_COLUMNS, rows, delimiter)
}

pub fn render_facts(facts: &[OccurrenceFact], delimiter: char) -> String {
    let rows = facts.iter().map(|f| {
        vec![
            Some(f.occurrence_id.clone()),
            num(f.categoria_id),
            num(f.applicant_role_id),
            f.priority.clone(),
            num(f.reported_timestamp),
            num(f.arrival_timestamp),
            num(f.resolved_timestamp),
            num(f.latitude),
            num(f.longitude),
        ]
    });
    render_csv(FATO_OCORRENCIA_COLUMNS, rows, delimiter)
}

/// Write the three star-schema tables into `output.dir`, creating it if needed.
pub fn write_star_schema(model: &StarSchema, output: &OutputConfig) -> Result<WrittenFiles, EtlError> {
    let dir = output.dir.as_path();
    std::fs::create_dir_all(dir).map_err(|e| EtlError::write(dir, e))?;

    let delimiter = output.delimiter;
    let files = WrittenFiles {
        dim_categoria: write_table(
            dir,
            DIM_CATEGORIA_FILE,
            &render_categories(&model.categories, delimiter),
        )?,
        dim_applicant_role: write_table(
            dir,
            DIM_APPLICANT_ROLE_FILE,
            &render_roles(&model.roles, delimiter),
        )?,
        fato_ocorrencia: write_table(
            dir,
            FATO_OCORRENCIA_FILE,
            &render_facts(&model.facts, delimiter),
        )?,
    };

    info!(
        dir = %dir.display(),
        categories = model.categories.len(),
        applicant_roles = model.roles.len(),
        facts = model.facts.len(),
        "Star schema written"
    );
    Ok(files)
}

fn write_table(dir: &Path, name: &str, content: &str) -> Result<PathBuf, EtlError> {
    let path = dir.join(name);
    atomic_write(&path, content.as_bytes()).map_err(|e| EtlError::write(&path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "Table written");
    Ok(path)
}
