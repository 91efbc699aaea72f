use std::collections::HashMap;

use crate::analytics::AnalyticsSummary;
use crate::backends::SentimentService;
use crate::error::Result;
use crate::features::FeatureOutcome;
use crate::store::{Field, IssueRecord};

const SEPARATOR_WIDTH: usize = 50;

/// Render the aggregation report as the user-facing analytics answer.
pub fn compose_summary(summary: &AnalyticsSummary) -> String {
  let mut out = String::new();
  out.push_str("Analytics Summary:\n");
  out.push_str(&format!("Total Issues: {}\n", summary.total_issues));
  out.push_str(&format!("Status Distribution:\n{}", distribution_lines(&summary.status_dist)));
  out.push_str(&format!("Priority Distribution:\n{}", distribution_lines(&summary.priority_dist)));
  out.push_str(&format!(
    "Issue Type Distribution:\n{}",
    distribution_lines(&summary.issue_type_dist)
  ));
  out.push_str(&format!("Project Distribution:\n{}", distribution_lines(&summary.project_dist)));
  out.push_str(&format!("Average Sentiment: {:.2}", summary.avg_sentiment));
  out
}

/// Deterministic rendering of an unordered distribution: count descending,
/// ties alphabetical.
fn distribution_lines(dist: &HashMap<String, usize>) -> String {
  let mut entries: Vec<(&String, &usize)> = dist.iter().collect();
  entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

  entries
    .into_iter()
    .map(|(value, count)| {
      let label = if value.is_empty() { "(empty)" } else { value };
      format!("  {label}: {count}\n")
    })
    .collect()
}

/// Render ranked similarity hits as the user-facing answer.
///
/// Sentiment is recomputed per result from the fingerprint text rather than
/// cached at preparation time; that simplification is part of the contract.
/// A record with degraded features is rendered without an entity line, never
/// as an error. Missing non-defaulted fields do fail here, and the `respond`
/// boundary turns that into the apology string.
pub fn compose_results(
  records: &[IssueRecord],
  fingerprints: &[String],
  features: &[FeatureOutcome],
  hits: &[(usize, f32)],
  sentiment: &dyn SentimentService,
) -> Result<String> {
  let mut out = String::from("Found similar issues:\n\n");

  for &(position, _score) in hits {
    let record = &records[position];
    out.push_str(&format!("Issue Key: {}\n", record.require(Field::IssueKey)?));
    out.push_str(&format!("Type: {}\n", record.require(Field::IssueType)?));
    out.push_str(&format!("Summary: {}\n", record.summary));
    out.push_str(&format!("Status: {}\n", record.require(Field::Status)?));
    out.push_str(&format!("Priority: {}\n", record.require(Field::Priority)?));
    out.push_str(&format!("Project: {}\n", record.require(Field::ProjectName)?));
    out.push_str(&format!("Sentiment: {:.2}\n", sentiment.score(&fingerprints[position])));

    let entities = features[position].entities();
    if !entities.is_empty() {
      let surface_forms: Vec<&str> = entities.iter().map(|(form, _label)| form.as_str()).collect();
      out.push_str(&format!("Entities: {}\n", surface_forms.join(", ")));
    }

    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push('\n');
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backends::LexiconSentiment;
  use crate::error::Error;
  use crate::features::Features;
  use crate::fingerprint::build_fingerprint;
  use crate::store::{RecordStore, Row};

  fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), Some(v.to_string()))).collect()
  }

  fn summary_fixture() -> AnalyticsSummary {
    AnalyticsSummary {
      total_issues: 2,
      status_dist: HashMap::from([("Open".to_string(), 2)]),
      priority_dist: HashMap::from([("High".to_string(), 1), ("Low".to_string(), 1)]),
      issue_type_dist: HashMap::from([("Bug".to_string(), 2)]),
      project_dist: HashMap::from([("Web".to_string(), 2)]),
      avg_sentiment: -0.25,
    }
  }

  #[test]
  fn test_compose_summary_layout() {
    let text = compose_summary(&summary_fixture());
    assert!(text.starts_with("Analytics Summary:\n"));
    assert!(text.contains("Total Issues: 2"));
    assert!(text.contains("Status Distribution:\n  Open: 2"));
    assert!(text.contains("Average Sentiment: -0.25"));
  }

  #[test]
  fn test_distribution_lines_sort_desc_then_alpha() {
    let dist = HashMap::from([
      ("Low".to_string(), 1),
      ("High".to_string(), 3),
      ("Blocker".to_string(), 1),
    ]);
    assert_eq!(distribution_lines(&dist), "  High: 3\n  Blocker: 1\n  Low: 1\n");
  }

  #[test]
  fn test_distribution_labels_empty_values() {
    let dist = HashMap::from([("".to_string(), 2)]);
    assert_eq!(distribution_lines(&dist), "  (empty): 2\n");
  }

  fn fixture_store() -> RecordStore {
    RecordStore::from_rows(
      vec![row(&[
        ("Summary", "Checkout crash on submit"),
        ("Issue key", "WEB-7"),
        ("Issue Type", "Bug"),
        ("Status", "Open"),
        ("Priority", "High"),
        ("Project name", "Webshop"),
      ])],
      None,
    )
    .unwrap()
  }

  #[test]
  fn test_compose_results_renders_ranked_fields() {
    let store = fixture_store();
    let fingerprints: Vec<String> = store.records().iter().map(build_fingerprint).collect();
    let features = vec![FeatureOutcome::Extracted(Features {
      tokens: vec!["checkout".to_string()],
      entities: vec![("WEB-7".to_string(), "ISSUE_KEY".to_string())],
    })];

    let text = compose_results(
      store.records(),
      &fingerprints,
      &features,
      &[(0, 0.9)],
      &LexiconSentiment,
    )
    .unwrap();

    assert!(text.starts_with("Found similar issues:\n\n"));
    assert!(text.contains("Issue Key: WEB-7"));
    assert!(text.contains("Type: Bug"));
    assert!(text.contains("Summary: Checkout crash on submit"));
    assert!(text.contains("Entities: WEB-7"));
    assert!(text.contains(&"-".repeat(50)));
  }

  #[test]
  fn test_compose_results_skips_entity_line_when_degraded() {
    let store = fixture_store();
    let fingerprints: Vec<String> = store.records().iter().map(build_fingerprint).collect();
    let features = vec![FeatureOutcome::Degraded { reason: "boom".to_string() }];

    let text = compose_results(
      store.records(),
      &fingerprints,
      &features,
      &[(0, 0.9)],
      &LexiconSentiment,
    )
    .unwrap();

    assert!(!text.contains("Entities:"));
    assert!(text.contains("Issue Key: WEB-7"));
  }

  #[test]
  fn test_compose_results_fails_on_missing_field() {
    let store = RecordStore::from_rows(vec![row(&[("Summary", "no key column")])], None).unwrap();
    let fingerprints: Vec<String> = store.records().iter().map(build_fingerprint).collect();
    let features = vec![FeatureOutcome::Extracted(Features::default())];

    let err = compose_results(
      store.records(),
      &fingerprints,
      &features,
      &[(0, 0.5)],
      &LexiconSentiment,
    )
    .unwrap_err();
    assert!(matches!(err, Error::FieldMissing(_)));
  }

  #[test]
  fn test_compose_results_with_no_hits() {
    let text =
      compose_results(&[], &[], &[], &[], &LexiconSentiment).unwrap();
    assert_eq!(text, "Found similar issues:\n\n");
  }
}
