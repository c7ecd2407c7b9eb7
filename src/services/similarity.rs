//! Content-based ranking over a catalog snapshot
//!
//! Products are embedded as TF-IDF vectors over `name description category`
//! and scored against the query by cosine similarity. The index is a plain
//! value built per request; nothing is shared between requests.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, ProductRecord},
};

/// Fixed English stopword set removed before weighting
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "done", "down",
    "due", "during", "each", "eg", "either", "else", "elsewhere", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "for", "former",
    "formerly", "from", "further", "had", "has", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his", "how",
    "however", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just", "last",
    "latter", "least", "less", "many", "may", "me", "meanwhile", "might", "more", "moreover",
    "most", "mostly", "much", "must", "my", "myself", "namely", "neither", "never",
    "nevertheless", "next", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now",
    "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps",
    "please", "rather", "re", "same", "seem", "seemed", "seeming", "seems", "several", "she",
    "should", "since", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "than", "that", "the", "their", "them",
    "themselves", "then", "thence", "there", "thereafter", "thereby", "therefore", "therein",
    "thereupon", "these", "they", "this", "those", "though", "through", "throughout", "thru",
    "thus", "to", "together", "too", "toward", "towards", "under", "until", "up", "upon", "us",
    "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

/// Sparse term-id to weight map, L2-normalized
type SparseVector = HashMap<usize, f64>;

/// Lowercased word tokens of two or more characters, stopwords removed
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
}

fn normalize(mut vector: SparseVector) -> SparseVector {
    // Summed in sorted order, so equal weight sets give bit-identical norms
    let mut squares: Vec<f64> = vector.values().map(|w| w * w).collect();
    squares.sort_by(f64::total_cmp);
    let norm = squares.iter().sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.values_mut().for_each(|w| *w /= norm);
    }
    vector
}

fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

/// Fitted TF-IDF vector space over one catalog snapshot
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
    products: Vec<ProductRecord>,
}

impl TfidfIndex {
    /// Builds the vector space. Uses smoothed idf, `ln((1 + n) / (1 + df)) + 1`.
    pub fn build(products: Vec<ProductRecord>) -> Self {
        let documents: Vec<Vec<String>> = products
            .iter()
            .map(|p| tokenize(&p.document()).collect())
            .collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for tokens in &documents {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let term = *vocabulary.entry(token.clone()).or_insert(next_id);
                if term == document_frequency.len() {
                    document_frequency.push(0);
                }
                if !seen.contains(&term) {
                    seen.push(term);
                    document_frequency[term] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            vectors: Vec::with_capacity(documents.len()),
            products,
        };
        index.vectors = documents
            .iter()
            .map(|tokens| index.vectorize(tokens.iter().map(String::as_str)))
            .collect();
        index
    }

    /// Tokens outside the fitted vocabulary are ignored
    fn vectorize<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> SparseVector {
        let mut counts: SparseVector = HashMap::new();
        for token in tokens {
            if let Some(&term) = self.vocabulary.get(token) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }
        for (term, weight) in counts.iter_mut() {
            *weight *= self.idf[*term];
        }
        normalize(counts)
    }

    /// Cosine similarity of `query` against every product, in catalog order
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let tokens: Vec<String> = tokenize(query).collect();
        let query_vector = self.vectorize(tokens.iter().map(String::as_str));
        self.vectors
            .iter()
            .map(|vector| dot(&query_vector, vector))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Similarity recommender for a single request
///
/// Holds no state beyond its own fitted index, so each request builds its
/// own and concurrent requests never observe each other's catalog.
#[derive(Debug, Clone, Default)]
pub struct SimilarityRecommender {
    index: Option<TfidfIndex>,
}

impl SimilarityRecommender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous index with one built from `catalog`
    pub fn fit(&mut self, catalog: Vec<ProductRecord>) {
        let index = TfidfIndex::build(catalog);
        tracing::debug!(
            products = index.len(),
            terms = index.vocabulary.len(),
            "Fitted similarity index"
        );
        self.index = Some(index);
    }

    /// Top `top_k` products by cosine similarity to `query`
    ///
    /// Ties keep catalog order. Scores are `floor(similarity * 100)` in [0, 100].
    pub fn rank(&self, query: &str, top_k: usize) -> AppResult<Vec<Candidate>> {
        let index = self.index.as_ref().ok_or(AppError::NotFitted)?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f64)> = index.similarities(query).into_iter().enumerate().collect();
        // Stable sort, so equal similarities stay in catalog order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let candidates = scored
            .into_iter()
            .take(top_k)
            .map(|(position, similarity)| {
                let product = &index.products[position];
                let score = match_score(similarity);
                Candidate::from_product(product, Some(score), match_reason(product, query, score))
            })
            .collect();

        Ok(candidates)
    }
}

/// Fits a fresh recommender on `catalog` and ranks it against `query`
pub fn rank_catalog(catalog: Vec<ProductRecord>, query: &str, top_k: usize) -> AppResult<Vec<Candidate>> {
    let mut recommender = SimilarityRecommender::new();
    recommender.fit(catalog);
    recommender.rank(query, top_k)
}

fn match_score(similarity: f64) -> u8 {
    (similarity * 100.0).floor().clamp(0.0, 100.0) as u8
}

fn match_reason(product: &ProductRecord, query: &str, score: u8) -> String {
    let mut reason = format!("This product matches your search for '{}'.", query);

    reason.push_str(&format!(" Brand: {}.", product.brand_or_default()));

    let reviews = product.reviews_or_default();
    if reviews > 0 {
        reason.push_str(&format!(" Has {} reviews.", reviews));
    }

    reason.push_str(&format!(" Match Score: {}/100", score));
    reason
}
