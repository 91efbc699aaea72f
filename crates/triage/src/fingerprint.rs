use crate::store::IssueRecord;

/// Build the semantic fingerprint text for one record.
///
/// The field order (Summary, Description, Resolution, Issue_Type,
/// Project_name) is fixed and significant: it defines the embedding text, so
/// changing it changes the meaning of every stored vector and requires
/// rebuilding the index under a new model version.
pub fn build_fingerprint(record: &IssueRecord) -> String {
  [
    record.summary.as_str(),
    record.description.as_str(),
    record.resolution.as_str(),
    record.issue_type.as_deref().unwrap_or(""),
    record.project_name.as_deref().unwrap_or(""),
  ]
  .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::RecordStore;
  use std::collections::BTreeMap;

  fn record(pairs: &[(&str, &str)]) -> IssueRecord {
    let row: BTreeMap<String, Option<String>> =
      pairs.iter().map(|(k, v)| (k.to_string(), Some(v.to_string()))).collect();
    let store = RecordStore::from_rows(vec![row], None).unwrap();
    store.records()[0].clone()
  }

  #[test]
  fn test_fingerprint_uses_fixed_field_order() {
    let r = record(&[
      ("Summary", "s"),
      ("Description", "d"),
      ("Resolution", "r"),
      ("Issue Type", "Bug"),
      ("Project name", "Web"),
    ]);
    assert_eq!(build_fingerprint(&r), "s d r Bug Web");
  }

  #[test]
  fn test_fingerprint_missing_fields_become_empty() {
    let r = record(&[("Summary", "only summary")]);
    assert_eq!(build_fingerprint(&r), "only summary    ");
  }

  #[test]
  fn test_fingerprint_of_fully_empty_record_is_whitespace() {
    let r = record(&[]);
    assert_eq!(build_fingerprint(&r), "    ");
  }
}
