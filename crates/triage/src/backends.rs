//! Pluggable service boundaries consumed by the engine.
//!
//! The engine never talks to a concrete model: embedding, normalization,
//! intent prediction and sentiment scoring are traits, so a backend can be
//! swapped without touching retrieval or routing logic. The default
//! implementations here are deterministic and fully local.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::features::Features;

/// Text to fixed-length vector. Same length out as in, order-preserving.
pub trait EmbeddingService {
  fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

  /// Identity of the model producing the vectors. Vectors from different
  /// versions are not comparable and the index rejects a mismatch.
  fn model_version(&self) -> &str;
}

/// Text to tokens and entity surface forms.
pub trait NormalizeService {
  fn normalize(&self, text: &str) -> Result<Features>;
}

/// Query features to a raw intent label.
pub trait IntentService {
  fn predict_intent(&self, features: &Features) -> Result<String>;
}

/// Text to a sentiment score in [-1.0, 1.0].
pub trait SentimentService {
  fn score(&self, text: &str) -> f32;
}

/// The full set of services the engine needs, bundled for construction.
pub struct Backends {
  pub embedder: Box<dyn EmbeddingService>,
  pub normalizer: Box<dyn NormalizeService>,
  pub intents: Box<dyn IntentService>,
  pub sentiment: Box<dyn SentimentService>,
}

impl Backends {
  /// The deterministic local stack: hashing embedder, stop-word normalizer,
  /// keyword intent classifier, lexicon sentiment.
  pub fn local(dimensions: usize) -> Self {
    Self {
      embedder: Box::new(HashEmbedder::new(dimensions)),
      normalizer: Box::new(WordNormalizer),
      intents: Box::new(KeywordIntentClassifier),
      sentiment: Box::new(LexiconSentiment),
    }
  }
}

impl Default for Backends {
  fn default() -> Self {
    Self::local(DEFAULT_DIMENSIONS)
  }
}

pub const DEFAULT_DIMENSIONS: usize = 256;

/// Signed feature-hashing bag-of-words embedder, L2-normalized.
pub struct HashEmbedder {
  dimensions: usize,
  version: String,
}

impl HashEmbedder {
  pub fn new(dimensions: usize) -> Self {
    let dimensions = dimensions.max(8);
    Self { dimensions, version: format!("hash-bow-v1-d{dimensions}") }
  }

  fn embed_one(&self, text: &str) -> Vec<f32> {
    let mut vector = vec![0_f32; self.dimensions];
    let tokens = extract_words_ordered(text);

    if tokens.is_empty() {
      return vector;
    }

    for token in &tokens {
      let hash = stable_hash(token);
      let index = (hash as usize) % self.dimensions;
      let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
      let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
      vector[index] += sign * weight;
    }

    normalize_vector(&mut vector);
    vector
  }
}

impl EmbeddingService for HashEmbedder {
  fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    Ok(texts.iter().map(|t| self.embed_one(t)).collect())
  }

  fn model_version(&self) -> &str {
    &self.version
  }
}

fn stable_hash(token: &str) -> u64 {
  let mut hasher = DefaultHasher::new();
  token.hash(&mut hasher);
  hasher.finish()
}

fn normalize_vector(vector: &mut [f32]) {
  let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
  if norm > 0.0 {
    for v in vector.iter_mut() {
      *v /= norm;
    }
  }
}

/// Common English stop words filtered out of tokens
const STOP_WORDS: &[&str] = &[
  // Articles and determiners
  "the", "a", "an", // Conjunctions
  "and", "or", "but", // Prepositions
  "in", "on", "at", "to", "for", "of", "with", "by", "over", // Common verbs
  "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will",
  "would", "could", "should", // Pronouns
  "you", "your", "we", "our", "us", "they", "them", "their", "it", "its",
];

fn stop_words() -> HashSet<&'static str> {
  STOP_WORDS.iter().copied().collect()
}

/// Extract meaningful lowercase words from text in document order.
fn extract_words_ordered(text: &str) -> Vec<String> {
  let stop_words = stop_words();

  text
    .split_whitespace()
    .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
    .filter(|word| !word.is_empty() && !stop_words.contains(word.as_str()))
    .collect()
}

static ISSUE_KEY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z0-9]+-\d+\b").unwrap());

/// Stop-word tokenizer with heuristic entity extraction.
///
/// Entities are issue-key shaped tokens (`WEB-123`) and TitleCase surface
/// forms, the two shapes that matter for issue-tracker text.
pub struct WordNormalizer;

impl NormalizeService for WordNormalizer {
  fn normalize(&self, text: &str) -> Result<Features> {
    let tokens = extract_words_ordered(text);

    let mut entities: Vec<(String, String)> = ISSUE_KEY_RE
      .find_iter(text)
      .map(|m| (m.as_str().to_string(), "ISSUE_KEY".to_string()))
      .collect();

    for word in text.split_whitespace() {
      let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
      if clean.len() >= 3 && is_title_case(clean) && !ISSUE_KEY_RE.is_match(clean) {
        entities.push((clean.to_string(), "PROPER_NOUN".to_string()));
      }
    }

    Ok(Features { tokens, entities })
  }
}

fn is_title_case(word: &str) -> bool {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) if first.is_uppercase() => chars.all(|c| c.is_lowercase()),
    _ => false,
  }
}

// --- Intent keyword patterns (compiled once) ---

static ANALYTICS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(analytics|statistics|stats|report|dashboard|breakdown|distribution|how\s+many|total\s+issues)\b").unwrap()
});

static STATUS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(status|statuses)\b").unwrap());

static PRIORITY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(priority|priorities|severity)\b").unwrap());

static TYPE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(issue\s+types?|kinds?\s+issues?)\b").unwrap());

static PROJECT_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(projects?)\b").unwrap());

/// Keyword-scored intent prediction over the query's tokens.
///
/// Deterministic two-way scoring: each analytic label gets a score from its
/// keyword pattern, similarity carries a base score and wins when nothing
/// analytic fires.
pub struct KeywordIntentClassifier;

impl IntentService for KeywordIntentClassifier {
  fn predict_intent(&self, features: &Features) -> Result<String> {
    let text = features.tokens.join(" ");
    let base_similarity = 4.0;

    let scores = vec![
      ("analytics", pattern_score(&ANALYTICS_RE, &text, 12.0)),
      ("status", pattern_score(&STATUS_RE, &text, 10.0)),
      ("priority", pattern_score(&PRIORITY_RE, &text, 10.0)),
      ("type", pattern_score(&TYPE_RE, &text, 10.0)),
      ("project", pattern_score(&PROJECT_RE, &text, 10.0)),
      ("similarity", base_similarity),
    ];

    scores
      .into_iter()
      .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
      .map(|(label, _)| label.to_string())
      .ok_or_else(|| anyhow!("no intent labels scored"))
  }
}

fn pattern_score(pattern: &Regex, text: &str, weight: f32) -> f32 {
  if pattern.is_match(text) {
    weight
  } else {
    0.0
  }
}

const POSITIVE_WORDS: &[&str] = &[
  "good", "great", "fixed", "resolved", "works", "working", "success", "successful", "improved",
  "fast", "stable", "clean", "complete", "completed", "done", "passing",
];

const NEGATIVE_WORDS: &[&str] = &[
  "bad", "error", "errors", "fail", "fails", "failed", "failure", "crash", "crashes", "broken",
  "slow", "bug", "bugs", "wrong", "blocked", "critical", "regression", "timeout", "leak",
];

/// Word-list sentiment scorer, bounded to [-1.0, 1.0].
pub struct LexiconSentiment;

impl SentimentService for LexiconSentiment {
  fn score(&self, text: &str) -> f32 {
    let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
    let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();

    let mut pos = 0usize;
    let mut neg = 0usize;
    for word in extract_words_ordered(text) {
      if positive.contains(word.as_str()) {
        pos += 1;
      } else if negative.contains(word.as_str()) {
        neg += 1;
      }
    }

    if pos + neg == 0 {
      0.0
    } else {
      (pos as f32 - neg as f32) / (pos + neg) as f32
    }
  }
}

/// Mock embedding service for testing
pub struct MockEmbedder {
  pub fail_on_texts: Vec<String>,
  pub response_embeddings: Vec<Vec<f32>>,
  pub drop_last: bool,
  version: String,
}

impl Default for MockEmbedder {
  fn default() -> Self {
    Self::new()
  }
}

impl MockEmbedder {
  pub fn new() -> Self {
    Self {
      fail_on_texts: vec![],
      response_embeddings: vec![vec![0.1, 0.2, 0.3]; 10],
      drop_last: false,
      version: "mock-v1".to_string(),
    }
  }

  pub fn with_failure_on(mut self, text: String) -> Self {
    self.fail_on_texts.push(text);
    self
  }

  pub fn with_embeddings(mut self, embeddings: Vec<Vec<f32>>) -> Self {
    self.response_embeddings = embeddings;
    self
  }

  /// Return one vector fewer than requested, to simulate a truncating service.
  pub fn with_dropped_output(mut self) -> Self {
    self.drop_last = true;
    self
  }

  pub fn with_version(mut self, version: &str) -> Self {
    self.version = version.to_string();
    self
  }
}

impl EmbeddingService for MockEmbedder {
  fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    for text in texts {
      if self.fail_on_texts.contains(text) {
        return Err(anyhow!("mock failure for text: {text}"));
      }
    }

    let mut result = Vec::new();
    for (i, _text) in texts.iter().enumerate() {
      let embedding_index = i % self.response_embeddings.len();
      result.push(self.response_embeddings[embedding_index].clone());
    }

    if self.drop_last {
      result.pop();
    }

    Ok(result)
  }

  fn model_version(&self) -> &str {
    &self.version
  }
}

/// Normalizer that fails for texts containing a marker substring and
/// otherwise behaves like `WordNormalizer`.
pub struct FailingNormalizer {
  pub fail_on_substring: String,
}

impl NormalizeService for FailingNormalizer {
  fn normalize(&self, text: &str) -> Result<Features> {
    if text.contains(&self.fail_on_substring) {
      return Err(anyhow!("mock normalization failure"));
    }
    WordNormalizer.normalize(text)
  }
}

/// Intent service that always answers with a fixed raw label.
pub struct FixedIntent(pub String);

impl IntentService for FixedIntent {
  fn predict_intent(&self, _features: &Features) -> Result<String> {
    Ok(self.0.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::similarity::cosine;

  #[test]
  fn test_hash_embedder_is_deterministic() {
    let embedder = HashEmbedder::new(64);
    let texts = vec!["login page crashes".to_string()];
    let a = embedder.embed(&texts).unwrap();
    let b = embedder.embed(&texts).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn test_hash_embedder_output_is_normalized() {
    let embedder = HashEmbedder::new(64);
    let vectors = embedder.embed(&["database timeout on save".to_string()]).unwrap();
    let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
  }

  #[test]
  fn test_hash_embedder_empty_text_yields_zero_vector() {
    let embedder = HashEmbedder::new(32);
    let vectors = embedder.embed(&["".to_string()]).unwrap();
    assert!(vectors[0].iter().all(|v| *v == 0.0));
  }

  #[test]
  fn test_hash_embedder_enforces_minimum_dimensions() {
    let embedder = HashEmbedder::new(2);
    let vectors = embedder.embed(&["x".to_string()]).unwrap();
    assert_eq!(vectors[0].len(), 8);
  }

  #[test]
  fn test_hash_embedder_similar_text_scores_higher() {
    let embedder = HashEmbedder::new(128);
    let corpus = vec![
      "login page crashes after password reset".to_string(),
      "report export renders blank pdf".to_string(),
    ];
    let vectors = embedder.embed(&corpus).unwrap();
    let query = embedder.embed(&["login crashes password".to_string()]).unwrap();

    let to_login = cosine(&query[0], &vectors[0]);
    let to_report = cosine(&query[0], &vectors[1]);
    assert!(to_login > to_report);
  }

  #[test]
  fn test_normalizer_filters_stop_words() {
    let features = WordNormalizer.normalize("the login page is broken").unwrap();
    assert!(!features.tokens.contains(&"the".to_string()));
    assert!(features.tokens.contains(&"login".to_string()));
    assert!(features.tokens.contains(&"broken".to_string()));
  }

  #[test]
  fn test_normalizer_extracts_issue_key_entities() {
    let features = WordNormalizer.normalize("regression from WEB-42 after deploy").unwrap();
    assert!(features.entities.contains(&("WEB-42".to_string(), "ISSUE_KEY".to_string())));
  }

  #[test]
  fn test_normalizer_extracts_title_case_entities() {
    let features = WordNormalizer.normalize("crash reported by Amanda in checkout").unwrap();
    assert!(features.entities.contains(&("Amanda".to_string(), "PROPER_NOUN".to_string())));
  }

  #[test]
  fn test_intent_classifier_detects_analytics() {
    let features = WordNormalizer.normalize("show me analytics").unwrap();
    let label = KeywordIntentClassifier.predict_intent(&features).unwrap();
    assert_eq!(label, "analytics");
  }

  #[test]
  fn test_intent_classifier_detects_priority() {
    let features = WordNormalizer.normalize("what is the priority spread").unwrap();
    let label = KeywordIntentClassifier.predict_intent(&features).unwrap();
    assert_eq!(label, "priority");
  }

  #[test]
  fn test_intent_classifier_falls_back_to_similarity() {
    let features = WordNormalizer.normalize("login page crashes after reset").unwrap();
    let label = KeywordIntentClassifier.predict_intent(&features).unwrap();
    assert_eq!(label, "similarity");
  }

  #[test]
  fn test_sentiment_is_bounded() {
    let scorer = LexiconSentiment;
    assert_eq!(scorer.score("crash error broken failed"), -1.0);
    assert_eq!(scorer.score("fixed resolved works great"), 1.0);
    assert_eq!(scorer.score("plain neutral text"), 0.0);
  }

  #[test]
  fn test_sentiment_mixed_text_is_fractional() {
    let score = LexiconSentiment.score("fixed the crash");
    assert!(score.abs() < 1.0);
  }

  #[test]
  fn test_mock_embedder_failure() {
    let embedder = MockEmbedder::new().with_failure_on("boom".to_string());
    assert!(embedder.embed(&["boom".to_string()]).is_err());
    assert!(embedder.embed(&["fine".to_string()]).is_ok());
  }
}
