use thiserror::Error;

/// Errors surfaced by the retrieval engine.
///
/// Preparation-time failures (`DataLoad`, `EmbeddingService`, `IndexCorrupt`)
/// are fatal: a corpus that fails to load or embed is unusable and must never
/// serve queries. Query-time failures are caught at the `respond` boundary
/// and converted to a fixed apology string.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to load dataset: {0}")]
  DataLoad(String),

  #[error("field '{0}' is not present in the dataset")]
  FieldMissing(String),

  #[error("embedding service error: {0}")]
  EmbeddingService(String),

  #[error("embedding index corrupt: {0}")]
  IndexCorrupt(String),

  #[error("index built with embedding model '{built_with}' but current service is '{current}'")]
  ModelMismatch { built_with: String, current: String },

  #[error("invalid query: {0}")]
  InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, Error>;
