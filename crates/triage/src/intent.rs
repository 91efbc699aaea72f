use tracing::warn;

use crate::backends::{IntentService, NormalizeService};
use crate::features;

/// The closed set of query intents. `Similarity` is the default and catches
/// every raw label the intent service emits outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
  Analytics,
  Status,
  Priority,
  Type,
  Project,
  Similarity,
}

impl Intent {
  pub fn from_label(label: &str) -> Self {
    match label {
      "analytics" => Intent::Analytics,
      "status" => Intent::Status,
      "priority" => Intent::Priority,
      "type" => Intent::Type,
      "project" => Intent::Project,
      _ => Intent::Similarity,
    }
  }

  /// All analytic intents route to the full aggregation report. The coarse
  /// five-to-one mapping is a product decision, not a gap.
  pub fn is_analytic(self) -> bool {
    !matches!(self, Intent::Similarity)
  }
}

/// Classify a query. Stateless per call; normalization and prediction
/// failures both fall back to similarity search rather than erroring.
pub fn classify(
  normalizer: &dyn NormalizeService,
  intents: &dyn IntentService,
  query: &str,
) -> Intent {
  let query_features = features::extract(normalizer, query).features();

  match intents.predict_intent(&query_features) {
    Ok(label) => Intent::from_label(&label),
    Err(e) => {
      warn!(error = %e, "intent prediction failed, falling back to similarity");
      Intent::Similarity
    }
  }
}
