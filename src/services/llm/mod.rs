//! Generative-model ranking
//!
//! The backend is treated as a noisy oracle: it receives a prompt listing part
//! of the catalog and answers with free text that should contain ranked product
//! IDs. Backend failures and unusable answers are recovered into
//! [`RankingOutcome::Fallback`]; only a timeout is surfaced to the caller.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, ProductRecord},
};

pub mod openai;
pub mod parser;
pub mod prompt;

pub use openai::OpenAiCompletions;

/// Text-completion backend used for ranking
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RankingBackend: Send + Sync {
    /// Sends `prompt` and returns the raw completion text
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Result of a ranking call that did not time out
#[derive(Debug, Clone, PartialEq)]
pub enum RankingOutcome {
    /// Candidates resolved from the backend's answer
    Ranked(Vec<Candidate>),
    /// Catalog-order substitutes used because the backend call failed or its
    /// answer named no known product
    Fallback(Vec<Candidate>),
}

impl RankingOutcome {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            RankingOutcome::Ranked(c) | RankingOutcome::Fallback(c) => c,
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            RankingOutcome::Ranked(c) | RankingOutcome::Fallback(c) => c,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RankingOutcome::Fallback(_))
    }
}

/// Ranks a catalog snapshot through a [`RankingBackend`]
#[derive(Clone)]
pub struct LlmRanker {
    backend: Arc<dyn RankingBackend>,
    timeout: Duration,
    corpus_limit: usize,
}

impl LlmRanker {
    pub fn new(backend: Arc<dyn RankingBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            corpus_limit: prompt::DEFAULT_CORPUS_LIMIT,
        }
    }

    pub fn with_corpus_limit(mut self, corpus_limit: usize) -> Self {
        self.corpus_limit = corpus_limit;
        self
    }

    /// Asks the backend to rank the catalog for `preferences`, keeping `top_k`
    ///
    /// The timeout only cancels this call's own request. Errors other than
    /// [`AppError::Timeout`] never leave this function.
    pub async fn rank_by_text(
        &self,
        preferences: &str,
        catalog: &[ProductRecord],
        top_k: usize,
    ) -> AppResult<RankingOutcome> {
        let prompt = prompt::ranking_prompt(preferences, catalog, self.corpus_limit);

        tracing::info!(
            backend = self.backend.name(),
            products = catalog.len().min(self.corpus_limit),
            top_k,
            "Requesting ranking from backend"
        );

        let response = match tokio::time::timeout(self.timeout, self.backend.complete(&prompt)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!(
                    backend = self.backend.name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Ranking backend timed out"
                );
                return Err(AppError::Timeout(format!(
                    "{} ranking backend did not answer in time",
                    self.backend.name()
                )));
            }
        };

        let outcome = match response {
            Ok(text) => parser::parse(&text, catalog, top_k),
            Err(e) => {
                tracing::error!(error = %e, backend = self.backend.name(), "Ranking backend call failed, using fallback");
                parser::fallback(catalog, top_k)
            }
        };

        tracing::info!(
            count = outcome.candidates().len(),
            fallback = outcome.is_fallback(),
            "Ranking backend candidates ready"
        );

        Ok(outcome)
    }
}
