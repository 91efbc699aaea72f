use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One row of the dataset as read from disk. A `None` value is a null cell.
pub type Row = BTreeMap<String, Option<String>>;

/// Canonical field names mapped onto the actual column names of a dataset.
///
/// Every canonical key always resolves to some column name; the column itself
/// may still be absent from the source data. Defaults follow the column names
/// of a standard issue-tracker export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
  #[serde(rename = "Summary")]
  pub summary: String,
  #[serde(rename = "Description")]
  pub description: String,
  #[serde(rename = "Resolution")]
  pub resolution: String,
  #[serde(rename = "Status")]
  pub status: String,
  #[serde(rename = "Priority")]
  pub priority: String,
  #[serde(rename = "issue_key")]
  pub issue_key: String,
  #[serde(rename = "Issue_Type")]
  pub issue_type: String,
  #[serde(rename = "Project_key")]
  pub project_key: String,
  #[serde(rename = "Project_name")]
  pub project_name: String,
}

impl Default for FieldMapping {
  fn default() -> Self {
    Self {
      summary: "Summary".to_string(),
      description: "Description".to_string(),
      resolution: "Resolution".to_string(),
      status: "Status".to_string(),
      priority: "Priority".to_string(),
      issue_key: "Issue key".to_string(),
      issue_type: "Issue Type".to_string(),
      project_key: "Project key".to_string(),
      project_name: "Project name".to_string(),
    }
  }
}

impl FieldMapping {
  /// Load a mapping from a YAML file keyed by canonical field names.
  /// Missing keys keep their default column names.
  pub fn from_yaml_file(path: &Path) -> Result<Self> {
    let raw = fs::read_to_string(path)
      .map_err(|e| Error::DataLoad(format!("{}: {e}", path.display())))?;
    serde_yaml::from_str(&raw).map_err(|e| Error::DataLoad(format!("{}: {e}", path.display())))
  }
}

/// The non-defaulted record fields. Referencing one that is absent from the
/// dataset fails with `Error::FieldMissing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Status,
  Priority,
  IssueType,
  ProjectKey,
  ProjectName,
  IssueKey,
}

impl Field {
  pub fn canonical_name(self) -> &'static str {
    match self {
      Field::Status => "Status",
      Field::Priority => "Priority",
      Field::IssueType => "Issue_Type",
      Field::ProjectKey => "Project_key",
      Field::ProjectName => "Project_name",
      Field::IssueKey => "issue_key",
    }
  }
}

/// One issue as held in memory after loading.
///
/// Summary, Description and Resolution are silently repaired to `""` when the
/// source column is absent, because every downstream consumer assumes they
/// exist. The remaining fields stay `None` when their column is absent;
/// `Some("")` (present but empty) is a different state than `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
  pub summary: String,
  pub description: String,
  pub resolution: String,
  pub status: Option<String>,
  pub priority: Option<String>,
  pub issue_type: Option<String>,
  pub project_key: Option<String>,
  pub project_name: Option<String>,
  pub issue_key: Option<String>,
}

impl IssueRecord {
  pub fn optional(&self, field: Field) -> Option<&str> {
    match field {
      Field::Status => self.status.as_deref(),
      Field::Priority => self.priority.as_deref(),
      Field::IssueType => self.issue_type.as_deref(),
      Field::ProjectKey => self.project_key.as_deref(),
      Field::ProjectName => self.project_name.as_deref(),
      Field::IssueKey => self.issue_key.as_deref(),
    }
  }

  /// Access a non-defaulted field, failing if its column was absent.
  pub fn require(&self, field: Field) -> Result<&str> {
    self
      .optional(field)
      .ok_or_else(|| Error::FieldMissing(field.canonical_name().to_string()))
  }
}

/// The loaded corpus. Read-only after construction; record order is the order
/// of rows in the source and is relied on by the embedding index.
#[derive(Debug, Clone)]
pub struct RecordStore {
  records: Vec<IssueRecord>,
  mapping: FieldMapping,
}

impl RecordStore {
  /// Load a JSON array of flat rows from disk.
  pub fn load(path: &Path, mapping: Option<FieldMapping>) -> Result<Self> {
    let raw = fs::read_to_string(path)
      .map_err(|e| Error::DataLoad(format!("{}: {e}", path.display())))?;
    let rows: Vec<Row> = serde_json::from_str(&raw)
      .map_err(|e| Error::DataLoad(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), rows = rows.len(), "loaded dataset");
    Self::from_rows(rows, mapping)
  }

  /// Build a store from already-parsed rows, preserving row order.
  ///
  /// Column presence is decided at table level (a column exists if any row
  /// carries it), matching tabular semantics: a present column with a missing
  /// cell yields an empty value, an absent column yields `None`.
  pub fn from_rows(rows: Vec<Row>, mapping: Option<FieldMapping>) -> Result<Self> {
    let mapping = mapping.unwrap_or_default();

    let columns: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
    for required in [&mapping.summary, &mapping.description, &mapping.resolution] {
      if !columns.contains(required.as_str()) {
        debug!(column = %required, "required column absent, defaulting to empty");
      }
    }

    let records = rows
      .iter()
      .map(|row| {
        let required = |column: &str| cell(row, column).unwrap_or_default();
        let optional = |column: &str| {
          if columns.contains(column) {
            Some(cell(row, column).unwrap_or_default())
          } else {
            None
          }
        };
        IssueRecord {
          summary: required(&mapping.summary),
          description: required(&mapping.description),
          resolution: required(&mapping.resolution),
          status: optional(&mapping.status),
          priority: optional(&mapping.priority),
          issue_type: optional(&mapping.issue_type),
          project_key: optional(&mapping.project_key),
          project_name: optional(&mapping.project_name),
          issue_key: optional(&mapping.issue_key),
        }
      })
      .collect();

    Ok(Self { records, mapping })
  }

  pub fn records(&self) -> &[IssueRecord] {
    &self.records
  }

  pub fn mapping(&self) -> &FieldMapping {
    &self.mapping
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

fn cell(row: &Row, column: &str) -> Option<String> {
  row.get(column).and_then(|v| v.clone())
}
