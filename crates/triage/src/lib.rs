//! Triage - semantic retrieval and analytics over issue-tracker exports
//!
//! Answers natural-language questions about a corpus of issue records by
//! retrieving the most semantically similar historical issues, or, for
//! statistical questions, an aggregate summary of the whole corpus. The
//! embedding, normalization, intent and sentiment backends are pluggable
//! service traits; the default stack is deterministic and fully local.

pub mod analytics;
pub mod backends;
pub mod chatbot;
pub mod compose;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod index;
pub mod intent;
pub mod similarity;
pub mod store;
