use tracing::{error, info};

use crate::analytics;
use crate::backends::Backends;
use crate::compose;
use crate::error::{Error, Result};
use crate::features::{self, FeatureOutcome};
use crate::fingerprint::build_fingerprint;
use crate::index::EmbeddingIndex;
use crate::intent;
use crate::store::RecordStore;

pub const DEFAULT_TOP_K: usize = 5;

pub const ANALYTICS_APOLOGY: &str = "Sorry, I encountered an error while generating analytics.";
pub const QUERY_APOLOGY: &str = "Sorry, I encountered an error while processing your query.";

/// The retrieval-and-dispatch engine.
///
/// Construction runs the whole preparation pass eagerly: fingerprints, the
/// embedding index (fatal on any failure) and per-record features (fail-open).
/// Everything is read-only afterwards; `respond` is stateless across calls.
pub struct Chatbot {
  store: RecordStore,
  backends: Backends,
  fingerprints: Vec<String>,
  features: Vec<FeatureOutcome>,
  index: EmbeddingIndex,
  top_k: usize,
}

impl std::fmt::Debug for Chatbot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Chatbot")
      .field("fingerprints", &self.fingerprints)
      .field("features", &self.features)
      .field("index", &self.index)
      .field("top_k", &self.top_k)
      .finish_non_exhaustive()
  }
}

impl Chatbot {
  pub fn new(store: RecordStore, backends: Backends) -> Result<Self> {
    Self::with_top_k(store, backends, DEFAULT_TOP_K)
  }

  pub fn with_top_k(store: RecordStore, backends: Backends, top_k: usize) -> Result<Self> {
    if top_k == 0 {
      return Err(Error::InvalidQuery("top_k must be a positive integer".to_string()));
    }

    info!(records = store.len(), "preparing corpus");

    let fingerprints: Vec<String> = store.records().iter().map(build_fingerprint).collect();

    let index = EmbeddingIndex::build(backends.embedder.as_ref(), &fingerprints)?;
    index.ensure_aligned(store.len())?;

    let features: Vec<FeatureOutcome> = fingerprints
      .iter()
      .map(|text| features::extract(backends.normalizer.as_ref(), text))
      .collect();

    let degraded = features.iter().filter(|f| f.is_degraded()).count();
    info!(records = store.len(), degraded, "corpus prepared");

    Ok(Self { store, backends, fingerprints, features, index, top_k })
  }

  /// Answer one query. Never fails outward: every query-time error is
  /// converted to a fixed apology string so a single bad query cannot crash
  /// the conversational surface.
  pub fn respond(&self, query: &str) -> String {
    let intent = intent::classify(
      self.backends.normalizer.as_ref(),
      self.backends.intents.as_ref(),
      query,
    );

    if intent.is_analytic() {
      self.analytics_response()
    } else {
      match self.similarity_response(query) {
        Ok(text) => text,
        Err(e) => {
          error!(error = %e, "similarity search failed");
          QUERY_APOLOGY.to_string()
        }
      }
    }
  }

  /// The full aggregation report, apology-wrapped. All five analytic
  /// sub-intents land here and always produce the full report.
  pub fn analytics_response(&self) -> String {
    let composed = analytics::report(
      &self.store,
      &self.fingerprints,
      self.backends.sentiment.as_ref(),
    )
    .map(|summary| compose::compose_summary(&summary));

    match composed {
      Ok(text) => text,
      Err(e) => {
        error!(error = %e, "analytics generation failed");
        ANALYTICS_APOLOGY.to_string()
      }
    }
  }

  fn similarity_response(&self, query: &str) -> Result<String> {
    let hits = self.index.query(self.backends.embedder.as_ref(), query, self.top_k)?;
    compose::compose_results(
      self.store.records(),
      &self.fingerprints,
      &self.features,
      &hits,
      self.backends.sentiment.as_ref(),
    )
  }

  pub fn store(&self) -> &RecordStore {
    &self.store
  }

  pub fn index(&self) -> &EmbeddingIndex {
    &self.index
  }

  pub fn fingerprints(&self) -> &[String] {
    &self.fingerprints
  }

  pub fn features(&self) -> &[FeatureOutcome] {
    &self.features
  }
}
