//! Baseline linear models: TF-IDF vectorization + linear decision function.
//!
//! The artifact is a single JSON bundle exported by the baseline training
//! script:
//!
//! ```json
//! {
//!   "vocabulary": {"great": 0, "product": 1, "great product": 2},
//!   "idf": [1.2, 1.0, 1.7],
//!   "ngram_range": [1, 2],
//!   "sublinear_tf": false,
//!   "coef": [[0.8, 0.1, 1.5]],
//!   "intercept": [-0.2]
//! }
//! ```
//!
//! Two-class models carry a single coefficient row (positive class).
//!
//! Input is cleaned the same way the training corpus was (URLs, emails and
//! @mentions dropped, `#tag` kept as `tag`, whitespace collapsed) unless the
//! bundle sets `"clean_text": false`.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{LoadError, PredictError};
use super::loader::Scorer;

/// Word tokens of two or more characters.
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)http\S+|www\S+").expect("static url pattern"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+").expect("static email pattern"));
static MENTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w+").expect("static mention pattern"));
static HASHTAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\w+)").expect("static hashtag pattern"));
static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Strip URLs, emails and mentions, unwrap hashtags, collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let text = URL_PATTERN.replace_all(text, "");
    let text = EMAIL_PATTERN.replace_all(&text, "");
    let text = MENTION_PATTERN.replace_all(&text, "");
    let text = HASHTAG_PATTERN.replace_all(&text, "$1");
    let text = WHITESPACE_PATTERN.replace_all(&text, " ");
    text.trim().to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// Serialized form of a baseline model.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearBundle {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_true")]
    pub clean_text: bool,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

// ============================================================================
// VECTORIZER
// ============================================================================

/// Fixed-vocabulary TF-IDF transform with L2 normalization.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f32>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    lowercase: bool,
    clean_text: bool,
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Word n-grams in document order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let cleaned;
        let text = if self.clean_text {
            cleaned = clean_text(text);
            cleaned.as_str()
        } else {
            text
        };
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(&text).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n {
            if n == 0 || n > tokens.len() {
                continue;
            }
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for gram in self.analyze(text) {
            if let Some(&col) = self.vocabulary.get(&gram) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut x = Array1::<f32>::zeros(self.n_features());
        for (col, tf) in counts {
            let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
            x[col] = tf * self.idf[col];
        }

        let norm = x.dot(&x).sqrt();
        if norm > 0.0 {
            x /= norm;
        }
        x
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Vectorizer + linear decision function `W·x + b`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    vectorizer: TfidfVectorizer,
    weights: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearModel {
    /// Parse and validate a bundle.
    pub fn from_bundle(bundle: LinearBundle, location: &str) -> Result<Self, LoadError> {
        let rows = bundle.coef.len();
        if rows == 0 {
            return Err(LoadError::corrupt(location, "coef has no rows"));
        }
        let n_features = bundle.idf.len();
        if bundle.coef.iter().any(|row| row.len() != n_features) {
            return Err(LoadError::corrupt(
                location,
                format!("coef rows must have {} columns (idf length)", n_features),
            ));
        }
        if bundle.intercept.len() != rows {
            return Err(LoadError::corrupt(
                location,
                format!("intercept has {} entries, expected {}", bundle.intercept.len(), rows),
            ));
        }
        if let Some((term, col)) = bundle.vocabulary.iter().find(|&(_, &c)| c >= n_features) {
            return Err(LoadError::corrupt(
                location,
                format!("vocabulary term '{}' maps to column {} out of range", term, col),
            ));
        }
        let (min_n, max_n) = bundle.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(LoadError::corrupt(
                location,
                format!("invalid ngram_range ({}, {})", min_n, max_n),
            ));
        }

        let flat: Vec<f32> = bundle.coef.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((rows, n_features), flat)
            .map_err(|e| LoadError::corrupt(location, e))?;

        Ok(Self {
            vectorizer: TfidfVectorizer {
                vocabulary: bundle.vocabulary,
                idf: Array1::from(bundle.idf),
                ngram_range: bundle.ngram_range,
                sublinear_tf: bundle.sublinear_tf,
                lowercase: bundle.lowercase,
                clean_text: bundle.clean_text,
            },
            weights,
            intercept: Array1::from(bundle.intercept),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let location = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::ArtifactMissing(location.clone()),
            _ => LoadError::corrupt(&location, e),
        })?;
        let bundle: LinearBundle =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::corrupt(&location, e))?;
        Self::from_bundle(bundle, &location)
    }

    /// Number of decision values produced per text.
    pub fn outputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn decision_function(&self, text: &str) -> Array1<f32> {
        let x = self.vectorizer.transform(text);
        self.weights.dot(&x) + &self.intercept
    }
}

impl Scorer for LinearModel {
    fn decision(&self, text: &str) -> Result<Vec<f32>, PredictError> {
        Ok(self.decision_function(text).to_vec())
    }

    fn output_count(&self) -> Option<usize> {
        Some(self.outputs())
    }

    fn backend(&self) -> &'static str {
        "tfidf-linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment_bundle() -> LinearBundle {
        let vocabulary: HashMap<String, usize> = [
            ("great", 0),
            ("product", 1),
            ("terrible", 2),
            ("great product", 3),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        LinearBundle {
            vocabulary,
            idf: vec![1.0, 1.0, 1.0, 2.0],
            ngram_range: (1, 2),
            sublinear_tf: false,
            lowercase: true,
            clean_text: true,
            coef: vec![vec![2.0, 0.0, -3.0, 1.0]],
            intercept: vec![-0.1],
        }
    }

    #[test]
    fn test_analyze_unigrams_and_bigrams() {
        let model = LinearModel::from_bundle(sentiment_bundle(), "mem").unwrap();
        let grams = model.vectorizer().analyze("Great product, a must!");
        // single-character "a" is dropped by the token pattern
        assert_eq!(
            grams,
            vec!["great", "product", "must", "great product", "product must"]
        );
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text("  Loved it!! #Blessed  see www.shop.io or mail me@x.org @bob\n"),
            "Loved it!! Blessed see or mail"
        );
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_urls_do_not_reach_vocabulary() {
        let mut bundle = sentiment_bundle();
        bundle.ngram_range = (1, 1);
        let model = LinearModel::from_bundle(bundle.clone(), "mem").unwrap();

        let plain = model.decision_function("terrible service");
        assert!(plain[0] < 0.0);
        assert_eq!(
            model.decision_function("terrible service https://great.example.com"),
            plain
        );
        assert_eq!(
            model.decision_function("terrible service @great great@product.com"),
            plain
        );

        bundle.clean_text = false;
        let raw = LinearModel::from_bundle(bundle, "mem").unwrap();
        assert_ne!(
            raw.decision_function("terrible service https://great.example.com"),
            plain
        );
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let model = LinearModel::from_bundle(sentiment_bundle(), "mem").unwrap();
        let x = model.vectorizer().transform("great product");
        let norm = x.dot(&x).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(x[3] > x[0], "bigram has higher idf");
    }

    #[test]
    fn test_empty_text_is_intercept_only() {
        let model = LinearModel::from_bundle(sentiment_bundle(), "mem").unwrap();
        let d = model.decision_function("");
        assert_eq!(d.to_vec(), vec![-0.1]);
    }

    #[test]
    fn test_decision_sign_follows_sentiment() {
        let model = LinearModel::from_bundle(sentiment_bundle(), "mem").unwrap();
        assert!(model.decision_function("great product")[0] > 0.0);
        assert!(model.decision_function("terrible")[0] < 0.0);
    }

    #[test]
    fn test_sublinear_tf() {
        let mut bundle = sentiment_bundle();
        bundle.sublinear_tf = true;
        bundle.ngram_range = (1, 1);
        let model = LinearModel::from_bundle(bundle, "mem").unwrap();
        // a single term normalizes to 1.0 regardless of repetition
        let x = model.vectorizer().transform("great great great");
        assert!((x[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_mismatched_intercept() {
        let mut bundle = sentiment_bundle();
        bundle.intercept = vec![0.0, 0.0];
        let err = LinearModel::from_bundle(bundle, "mem").unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_vocabulary() {
        let mut bundle = sentiment_bundle();
        bundle.vocabulary.insert("oops".to_string(), 99);
        assert!(LinearModel::from_bundle(bundle, "mem").is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = LinearModel::from_file(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, LoadError::ArtifactMissing(_)));
    }

    #[test]
    fn test_from_file_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not json at all").unwrap();
        let err = LinearModel::from_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }));
    }
}
