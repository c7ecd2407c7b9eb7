//! Hybrid merge of content-based and title-based candidates
//!
//! Passes run in a fixed order: content, title, additional. The content pass
//! is capped at `floor(limit * tfidf_weight)`. The title pass is capped only by
//! the overall `limit`, so it may take capacity the content pass left unused.

use std::collections::HashSet;

use crate::models::{Candidate, MatchScore, Source};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeParams {
    pub limit: usize,
    /// Share of `limit` reserved for content-based candidates, in [0, 1]
    pub tfidf_weight: f64,
    /// Candidates must score strictly above this to be kept
    pub min_score: u8,
}

impl MergeParams {
    pub fn content_budget(&self) -> usize {
        (self.limit as f64 * self.tfidf_weight).floor() as usize
    }

    /// Both rankers are asked for this many candidates
    pub fn candidate_pool(&self) -> usize {
        self.limit * 2
    }
}

/// Keeps content candidates scoring strictly above `min_score`
pub fn filter_content(candidates: Vec<Candidate>, min_score: u8) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.raw_score().is_some_and(|score| score > min_score))
        .collect()
}

/// Thresholds and tiers title-based candidates
///
/// A missing score counts as 0, so unscored fallback entries never pass the
/// threshold. Already tiered scores are not compared again. A missing reason
/// is filled in from the query.
pub fn prepare_title_candidates(candidates: Vec<Candidate>, min_score: u8, query: &str) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| match c.match_score {
            Some(MatchScore::Tier(_)) => true,
            Some(MatchScore::Raw(score)) => score > min_score,
            None => 0 > min_score,
        })
        .map(|mut c| {
            if c.reason.trim().is_empty() {
                c.reason = format!(
                    "Recommended based on your search for '{}'. Brand: {}.",
                    query, c.brand
                );
            }
            c.tiered()
        })
        .collect()
}

/// Builds the final ordered response from already filtered candidate lists
///
/// The result has unique ids, never exceeds `params.limit` and carries no
/// untiered numeric score.
pub fn merge(content: Vec<Candidate>, title: Vec<Candidate>, params: &MergeParams) -> Vec<Candidate> {
    let limit = params.limit;
    let content_budget = params.content_budget();

    let mut included: HashSet<i64> = HashSet::new();
    let mut merged: Vec<Candidate> = Vec::with_capacity(limit);

    for candidate in &content {
        if merged.len() >= content_budget {
            break;
        }
        if included.insert(candidate.id) {
            merged.push(candidate.clone().tiered().with_source(Source::ContentBased));
        }
    }

    for candidate in &title {
        if merged.len() >= limit {
            break;
        }
        if included.insert(candidate.id) {
            merged.push(candidate.clone().with_source(Source::TitleBased));
        }
    }

    let leftover_content: Vec<&Candidate> = content.iter().filter(|c| !included.contains(&c.id)).collect();
    let leftover_title: Vec<&Candidate> = title.iter().filter(|c| !included.contains(&c.id)).collect();

    for candidate in interleave(&leftover_content, &leftover_title) {
        if merged.len() >= limit {
            break;
        }
        if included.insert(candidate.id) {
            merged.push(candidate.clone().tiered().with_source(Source::Additional));
        }
    }

    tracing::debug!(
        content = merged.iter().filter(|c| c.source == Some(Source::ContentBased)).count(),
        title = merged.iter().filter(|c| c.source == Some(Source::TitleBased)).count(),
        additional = merged.iter().filter(|c| c.source == Some(Source::Additional)).count(),
        limit,
        "Merged hybrid candidates"
    );

    merged
}

/// Round-robin over both lists, starting with `first`
fn interleave<'a>(first: &[&'a Candidate], second: &[&'a Candidate]) -> Vec<&'a Candidate> {
    let mut out = Vec::with_capacity(first.len() + second.len());
    for i in 0..first.len().max(second.len()) {
        if let Some(c) = first.get(i) {
            out.push(*c);
        }
        if let Some(c) = second.get(i) {
            out.push(*c);
        }
    }
    out
}
