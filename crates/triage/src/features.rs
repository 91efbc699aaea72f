use tracing::warn;

use crate::backends::NormalizeService;

/// Tokens and entity surface forms produced by the normalization service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
  pub tokens: Vec<String>,
  pub entities: Vec<(String, String)>,
}

/// Per-record extraction result.
///
/// The fail-open policy is a data value rather than caught control flow: a
/// record whose normalization failed carries `Degraded` with empty features,
/// and preparation of the rest of the corpus continues.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
  Extracted(Features),
  Degraded { reason: String },
}

impl FeatureOutcome {
  pub fn features(&self) -> Features {
    match self {
      FeatureOutcome::Extracted(features) => features.clone(),
      FeatureOutcome::Degraded { .. } => Features::default(),
    }
  }

  pub fn entities(&self) -> &[(String, String)] {
    match self {
      FeatureOutcome::Extracted(features) => &features.entities,
      FeatureOutcome::Degraded { .. } => &[],
    }
  }

  pub fn is_degraded(&self) -> bool {
    matches!(self, FeatureOutcome::Degraded { .. })
  }
}

/// Run the normalization service on one text. Never propagates an error
/// outward; a single malformed record must not abort corpus preparation.
pub fn extract(service: &dyn NormalizeService, text: &str) -> FeatureOutcome {
  match service.normalize(text) {
    Ok(features) => FeatureOutcome::Extracted(features),
    Err(e) => {
      warn!(error = %e, "text normalization failed, continuing with empty features");
      FeatureOutcome::Degraded { reason: e.to_string() }
    }
  }
}
