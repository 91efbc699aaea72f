use tracing::{debug, info};

use crate::backends::EmbeddingService;
use crate::error::{Error, Result};
use crate::similarity;

/// Batch size for embedding-service calls. Large enough to amortize per-call
/// overhead, small enough to bound peak memory.
pub const BATCH_SIZE: usize = 32;

/// One fixed-length vector per record, in record order, tagged with the
/// identity of the model that produced it.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
  vectors: Vec<Vec<f32>>,
  model_version: String,
}

impl EmbeddingIndex {
  /// Embed all fingerprints in order. Any batch failure aborts the build;
  /// a partially built index must never be published, since it would
  /// silently degrade ranking.
  pub fn build(service: &dyn EmbeddingService, fingerprints: &[String]) -> Result<Self> {
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(fingerprints.len());

    for (batch_number, batch) in fingerprints.chunks(BATCH_SIZE).enumerate() {
      let embedded = service
        .embed(batch)
        .map_err(|e| Error::EmbeddingService(format!("batch {batch_number}: {e}")))?;

      if embedded.len() != batch.len() {
        return Err(Error::IndexCorrupt(format!(
          "embedding service returned {} vectors for a batch of {}",
          embedded.len(),
          batch.len()
        )));
      }

      vectors.extend(embedded);
      debug!(batch = batch_number, embedded = vectors.len(), "embedded batch");
    }

    if vectors.len() != fingerprints.len() {
      return Err(Error::IndexCorrupt(format!(
        "index holds {} vectors for {} records",
        vectors.len(),
        fingerprints.len()
      )));
    }

    info!(
      vectors = vectors.len(),
      model = service.model_version(),
      "embedding index built"
    );

    Ok(Self { vectors, model_version: service.model_version().to_string() })
  }

  pub fn len(&self) -> usize {
    self.vectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vectors.is_empty()
  }

  pub fn model_version(&self) -> &str {
    &self.model_version
  }

  /// Verify the record/vector alignment invariant before serving queries.
  pub fn ensure_aligned(&self, record_count: usize) -> Result<()> {
    if self.vectors.len() == record_count {
      Ok(())
    } else {
      Err(Error::IndexCorrupt(format!(
        "index holds {} vectors for {} records",
        self.vectors.len(),
        record_count
      )))
    }
  }

  /// Rank all records against a query text by cosine similarity.
  ///
  /// Returns `(record position, score)` pairs, descending by score, ties kept
  /// in original record order. The query must be embedded by the same service
  /// identity that built the index.
  pub fn query(
    &self,
    service: &dyn EmbeddingService,
    text: &str,
    top_k: usize,
  ) -> Result<Vec<(usize, f32)>> {
    if top_k == 0 {
      return Err(Error::InvalidQuery("top_k must be a positive integer".to_string()));
    }
    if service.model_version() != self.model_version {
      return Err(Error::ModelMismatch {
        built_with: self.model_version.clone(),
        current: service.model_version().to_string(),
      });
    }

    let query_text = [text.to_string()];
    let mut embedded =
      service.embed(&query_text).map_err(|e| Error::EmbeddingService(e.to_string()))?;
    if embedded.len() != 1 {
      return Err(Error::EmbeddingService(format!(
        "expected 1 query vector, got {}",
        embedded.len()
      )));
    }
    let query_vector = embedded.remove(0);

    let mut scored: Vec<(usize, f32)> = self
      .vectors
      .iter()
      .enumerate()
      .map(|(position, vector)| (position, similarity::cosine(&query_vector, vector)))
      .collect();

    // sort_by is stable, so equal scores keep original record order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    Ok(scored)
  }
}
