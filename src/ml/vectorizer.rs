//! TF-IDF vectorizer for text feature extraction.
//!
//! The vectorizer works on normalized text: terms are the whitespace tokens
//! of the input and the n-grams built from them (unigrams and bigrams by
//! default). Fitting keeps the `max_features` terms with the highest
//! document frequency, breaking ties lexicographically, so the vocabulary is
//! a pure function of the corpus.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::ml::sparse::SparseVector;

/// Default cap on vocabulary size.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// TF-IDF vectorizer for text feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Maximum number of retained terms.
    max_features: usize,
    /// Inclusive n-gram range.
    ngram_range: (usize, usize),
    /// Vocabulary: term -> feature index, indices in lexicographic term order.
    vocabulary: BTreeMap<String, usize>,
    /// Inverse document frequency per feature index.
    idf: Vec<f64>,
    /// Number of documents seen during fitting.
    n_documents: usize,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer over unigrams and bigrams.
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            ngram_range: (1, 2),
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            n_documents: 0,
        }
    }

    /// Set the inclusive n-gram range.
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 || min_n > max_n {
            return Err(VerityError::invalid_argument(format!(
                "invalid n-gram range ({min_n}, {max_n})"
            )));
        }
        self.ngram_range = (min_n, max_n);
        Ok(self)
    }

    /// Fit the vectorizer on a corpus of normalized documents.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<()> {
        if corpus.is_empty() {
            return Err(VerityError::empty_corpus("no documents to fit on"));
        }
        if self.max_features == 0 {
            return Err(VerityError::invalid_argument("max_features must be positive"));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique: HashSet<String> = self.terms(doc.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(VerityError::empty_corpus(
                "corpus contains no terms after normalization",
            ));
        }

        let n_candidates = document_frequency.len();
        let mut ranked: Vec<(String, usize)> = document_frequency.into_iter().collect();
        ranked.sort_by(|(ta, da), (tb, db)| db.cmp(da).then_with(|| ta.cmp(tb)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|(ta, _), (tb, _)| ta.cmp(tb));

        let n = corpus.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (index, (term, df)) in ranked.into_iter().enumerate() {
            // IDF = ln((N + 1) / (df + 1)) + 1
            idf.push(((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        debug!(
            "Fitted TF-IDF vocabulary: {} of {} candidate terms over {} documents",
            vocabulary.len(),
            n_candidates,
            corpus.len()
        );

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = corpus.len();

        Ok(())
    }

    /// Transform a normalized document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        if !self.is_fitted() {
            return Err(VerityError::not_fitted("TfIdfVectorizer"));
        }

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.terms(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .filter_map(|(idx, count)| self.idf.get(idx).map(|w| (idx, count * w)))
            .collect();

        let mut vector = SparseVector::from_pairs(self.vocabulary.len(), pairs);
        vector.normalize();
        Ok(vector)
    }

    /// Transform a batch of documents.
    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<SparseVector>> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// Fit on the corpus, then transform it.
    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(corpus)?;
        self.transform_all(corpus)
    }

    /// Check that the fitted state is internally consistent: a valid n-gram
    /// range and one idf weight per vocabulary index.
    pub fn check_consistency(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(VerityError::invalid_argument(format!(
                "invalid n-gram range ({min_n}, {max_n})"
            )));
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(VerityError::invalid_argument(format!(
                "{} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }
        let out_of_range = self
            .vocabulary
            .iter()
            .find(|(_, idx)| **idx >= self.idf.len());
        if let Some((term, idx)) = out_of_range {
            return Err(VerityError::invalid_argument(format!(
                "term '{term}' has feature index {idx} outside {} features",
                self.idf.len()
            )));
        }
        Ok(())
    }

    /// Whether `fit` has completed successfully.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// The fitted vocabulary, ordered by term.
    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Feature index of a term.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of a term.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).and_then(|idx| self.idf.get(idx).copied())
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// All n-grams of a document, with repetition.
    fn terms(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = document.split_whitespace().collect();
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "scientists discover breakthrough energy",
            "aliens landed downtown",
            "miracle cure discovered overnight",
            "scientists publish climate study",
        ]
    }

    #[test]
    fn test_fit_builds_unigrams_and_bigrams() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();

        assert!(vectorizer.is_fitted());
        assert!(vectorizer.term_index("scientists").is_some());
        assert!(vectorizer.term_index("aliens landed").is_some());
        assert!(vectorizer.term_index("landed aliens").is_none());
        assert_eq!(vectorizer.n_documents(), 4);

        // "scientists" appears in two documents, so it is weighted lower.
        let common = vectorizer.idf("scientists").unwrap();
        let rare = vectorizer.idf("aliens").unwrap();
        assert!(common < rare);
        assert!((rare - ((5.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_check_consistency() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();
        assert!(vectorizer.check_consistency().is_ok());

        let mut value = serde_json::to_value(&vectorizer).unwrap();
        value["vocabulary"] = serde_json::json!({ "aliens": 999 });
        value["idf"] = serde_json::json!([1.0]);
        let tampered: TfIdfVectorizer = serde_json::from_value(value).unwrap();
        assert!(tampered.check_consistency().is_err());
        // Out-of-range indices are skipped rather than indexed.
        assert!(tampered.transform("aliens landed").unwrap().is_empty());
        assert_eq!(tampered.idf("aliens"), None);

        let mut value = serde_json::to_value(&vectorizer).unwrap();
        value["idf"] = serde_json::json!([]);
        let truncated: TfIdfVectorizer = serde_json::from_value(value).unwrap();
        assert!(truncated.check_consistency().is_err());

        let mut value = serde_json::to_value(&vectorizer).unwrap();
        value["ngram_range"] = serde_json::json!([0, 2]);
        let bad_range: TfIdfVectorizer = serde_json::from_value(value).unwrap();
        assert!(bad_range.check_consistency().is_err());
    }

    #[test]
    fn test_vocabulary_indices_are_lexicographic() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();

        let indices: Vec<usize> = vectorizer.vocabulary().values().copied().collect();
        let expected: Vec<usize> = (0..vectorizer.vocabulary_size()).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn test_max_features_breaks_ties_lexicographically() {
        let mut vectorizer = TfIdfVectorizer::new(2).with_ngram_range(1, 1).unwrap();
        vectorizer.fit(&["delta alpha", "charlie alpha", "bravo"]).unwrap();

        // "alpha" has df 2; of the df-1 terms, "bravo" sorts first.
        let terms: Vec<&String> = vectorizer.vocabulary().keys().collect();
        assert_eq!(terms, vec!["alpha", "bravo"]);
        assert_eq!(vectorizer.term_index("alpha"), Some(0));
        assert_eq!(vectorizer.term_index("bravo"), Some(1));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let mut a = TfIdfVectorizer::default();
        let mut b = TfIdfVectorizer::default();
        a.fit(&corpus()).unwrap();
        b.fit(&corpus()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_known_and_unknown_terms() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();

        let known = vectorizer.transform("miracle cure").unwrap();
        let idx = vectorizer.term_index("miracle").unwrap();
        assert!(known.get(idx) > 0.0);
        assert!((known.norm() - 1.0).abs() < 1e-9);

        let unknown = vectorizer.transform("zebra unicorn").unwrap();
        assert!(unknown.is_empty());
        assert_eq!(unknown.dimension(), vectorizer.vocabulary_size());
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let vectorizer = TfIdfVectorizer::default();
        let err = vectorizer.transform("anything").unwrap_err();
        assert!(matches!(err, VerityError::NotFitted(_)));
    }

    #[test]
    fn test_empty_corpus_fails() {
        let mut vectorizer = TfIdfVectorizer::default();
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            vectorizer.fit(&empty).unwrap_err(),
            VerityError::EmptyCorpus(_)
        ));
        assert!(matches!(
            vectorizer.fit(&["", "   "]).unwrap_err(),
            VerityError::EmptyCorpus(_)
        ));
        assert!(!vectorizer.is_fitted());
    }

    #[test]
    fn test_invalid_ngram_range() {
        assert!(TfIdfVectorizer::new(10).with_ngram_range(0, 1).is_err());
        assert!(TfIdfVectorizer::new(10).with_ngram_range(3, 2).is_err());
    }
}
