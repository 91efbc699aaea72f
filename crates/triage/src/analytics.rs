use std::collections::HashMap;

use crate::backends::SentimentService;
use crate::error::Result;
use crate::store::{Field, RecordStore};

/// Distributional statistics over the whole corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
  pub total_issues: usize,
  pub status_dist: HashMap<String, usize>,
  pub priority_dist: HashMap<String, usize>,
  pub issue_type_dist: HashMap<String, usize>,
  pub project_dist: HashMap<String, usize>,
  pub avg_sentiment: f32,
}

/// Compute the full aggregation report.
///
/// Sentiment averages over the fingerprint texts, which are index-aligned
/// with the store's records. An empty corpus reports the sentinel 0.0 rather
/// than failing; analytics stay available even with no data. A corpus whose
/// Status/Priority/Issue_Type/Project_name column is absent fails with
/// `Error::FieldMissing` — present-but-empty values count normally.
pub fn report(
  store: &RecordStore,
  fingerprints: &[String],
  sentiment: &dyn SentimentService,
) -> Result<AnalyticsSummary> {
  let mut status_dist = HashMap::new();
  let mut priority_dist = HashMap::new();
  let mut issue_type_dist = HashMap::new();
  let mut project_dist = HashMap::new();

  for record in store.records() {
    *status_dist.entry(record.require(Field::Status)?.to_string()).or_insert(0) += 1;
    *priority_dist.entry(record.require(Field::Priority)?.to_string()).or_insert(0) += 1;
    *issue_type_dist.entry(record.require(Field::IssueType)?.to_string()).or_insert(0) += 1;
    *project_dist.entry(record.require(Field::ProjectName)?.to_string()).or_insert(0) += 1;
  }

  let avg_sentiment = if fingerprints.is_empty() {
    // Sentinel for the empty corpus; mean of zero samples is undefined
    0.0
  } else {
    fingerprints.iter().map(|text| sentiment.score(text)).sum::<f32>() / fingerprints.len() as f32
  };

  Ok(AnalyticsSummary {
    total_issues: store.len(),
    status_dist,
    priority_dist,
    issue_type_dist,
    project_dist,
    avg_sentiment,
  })
}
