//! Search and hybrid recommendation entry points
//!
//! Each call checks the cache, and on a miss fetches a fresh catalog snapshot,
//! ranks it, and writes the result back. Any failure on the miss path aborts
//! the whole call with a single [`AppError::Recommendation`].

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Candidate, ProductRecord},
    services::{
        catalog::CatalogProvider,
        llm::{prompt, LlmRanker},
        merge::{self, MergeParams},
        similarity,
    },
};

const SEARCH_CACHE_TTL: u64 = 600; // 10 minutes
const RECOMMENDATIONS_CACHE_TTL: u64 = 1800; // 30 minutes

const MAX_LIMIT: usize = 100;

const SEARCH_ERROR: &str = "Error searching products";
const RECOMMENDATION_ERROR: &str = "Error generating hybrid recommendations";

fn default_search_limit() -> usize {
    20
}

fn default_recommend_limit() -> usize {
    10
}

fn default_tfidf_weight() -> f64 {
    0.5
}

fn default_min_score() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendParams {
    pub query: String,
    #[serde(default = "default_recommend_limit")]
    pub limit: usize,
    #[serde(default = "default_tfidf_weight")]
    pub tfidf_weight: f64,
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

fn validate_query(query: &str) -> AppResult<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }
    Ok(query.to_string())
}

fn validate_limit(limit: usize) -> AppResult<usize> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit)
}

impl RecommendParams {
    fn validated(&self) -> AppResult<(String, MergeParams)> {
        let query = validate_query(&self.query)?;
        let limit = validate_limit(self.limit)?;

        if !(0.0..=1.0).contains(&self.tfidf_weight) {
            return Err(AppError::InvalidInput(
                "tfidf_weight must be between 0 and 1".to_string(),
            ));
        }
        if self.min_score > 100 {
            return Err(AppError::InvalidInput(
                "min_score must be between 0 and 100".to_string(),
            ));
        }

        Ok((
            query,
            MergeParams {
                limit,
                tfidf_weight: self.tfidf_weight,
                min_score: self.min_score as u8,
            },
        ))
    }
}

/// Ranks on the blocking pool so the vector math never stalls the runtime
async fn rank_content(catalog: Vec<ProductRecord>, query: String, top_k: usize) -> AppResult<Vec<Candidate>> {
    tokio::task::spawn_blocking(move || similarity::rank_catalog(catalog, &query, top_k))
        .await
        .map_err(|e| AppError::Internal(format!("Similarity task failed: {}", e)))?
}

#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<dyn CatalogProvider>,
    ranker: LlmRanker,
    cache: Cache,
}

impl RecommendationService {
    pub fn new(catalog: Arc<dyn CatalogProvider>, ranker: LlmRanker, cache: Cache) -> Self {
        Self {
            catalog,
            ranker,
            cache,
        }
    }

    /// Content-based search, scores stay numeric
    pub async fn search(&self, params: SearchParams) -> AppResult<Vec<Candidate>> {
        let query = validate_query(&params.query)?;
        let limit = validate_limit(params.limit)?;

        let key = CacheKey::Search {
            query: query.clone(),
            limit,
        };

        cached!(self.cache, key, SEARCH_CACHE_TTL, async {
            self.search_uncached(query.clone(), limit).await.map_err(|e| {
                tracing::error!(error = %e, query = %query, "Error searching products");
                AppError::recommendation(SEARCH_ERROR, e)
            })
        })
    }

    async fn search_uncached(&self, query: String, limit: usize) -> AppResult<Vec<Candidate>> {
        let catalog = self.catalog.list_products().await?;
        let results = rank_content(catalog, query.clone(), limit).await?;

        tracing::info!(query = %query, limit, count = results.len(), "Search completed");
        Ok(results)
    }

    /// Hybrid recommendations, every returned score is tiered
    pub async fn recommend(&self, params: RecommendParams) -> AppResult<Vec<Candidate>> {
        let (query, merge_params) = params.validated()?;

        let key = CacheKey::HybridRecommendations {
            query: query.clone(),
            limit: merge_params.limit,
            tfidf_weight: merge_params.tfidf_weight,
            min_score: merge_params.min_score,
        };

        cached!(self.cache, key, RECOMMENDATIONS_CACHE_TTL, async {
            self.recommend_uncached(&query, &merge_params)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, query = %query, "Error generating hybrid recommendations");
                    AppError::recommendation(RECOMMENDATION_ERROR, e)
                })
        })
    }

    async fn recommend_uncached(&self, query: &str, params: &MergeParams) -> AppResult<Vec<Candidate>> {
        tracing::info!(
            query = %query,
            limit = params.limit,
            tfidf_weight = params.tfidf_weight,
            min_score = params.min_score,
            catalog = self.catalog.name(),
            "Generating hybrid recommendations"
        );

        let catalog = self.catalog.list_products().await?;
        let pool = params.candidate_pool();
        let preferences = prompt::preferences_for_query(query);

        let (content, outcome) = tokio::try_join!(
            rank_content(catalog.clone(), query.to_string(), pool),
            self.ranker.rank_by_text(&preferences, &catalog, pool),
        )?;

        let fallback = outcome.is_fallback();
        let content = merge::filter_content(content, params.min_score);
        let title = merge::prepare_title_candidates(outcome.into_candidates(), params.min_score, query);

        let merged = merge::merge(content, title, params);

        tracing::info!(
            query = %query,
            count = merged.len(),
            limit = params.limit,
            min_score = params.min_score,
            fallback,
            "Generated hybrid recommendations"
        );

        Ok(merged)
    }
}
