use std::collections::HashMap;

use crate::models::{Candidate, ProductRecord};

use super::RankingOutcome;

/// Score given to the first resolved product; each later one gets 5 less
const TOP_SCORE: u8 = 95;
const SCORE_STEP: u8 = 5;

pub const AI_REASON: &str = "Recommended by AI based on your preferences.";
pub const FALLBACK_REASON: &str =
    "Popular pick from our catalog, shown while AI recommendations are unavailable.";

/// Product IDs in the order the backend listed them, first occurrence only
///
/// Comma-separated text is split on commas and non-numeric tokens are dropped.
/// Anything else is read line by line, keeping lines that are only digits.
pub fn extract_ids(text: &str) -> Vec<i64> {
    let text = text.trim();
    let ids: Vec<i64> = if text.contains(',') {
        text.split(',')
            .filter_map(|token| token.trim().parse().ok())
            .collect()
    } else {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|line| line.parse().ok())
            .collect()
    };

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Turns a ranked-ID response into at most `top_k` scored candidates
///
/// IDs missing from the catalog are skipped. When nothing resolves, the first
/// `top_k` catalog entries are returned as a fallback.
pub fn parse(text: &str, catalog: &[ProductRecord], top_k: usize) -> RankingOutcome {
    let by_id: HashMap<i64, &ProductRecord> = catalog.iter().map(|p| (p.id, p)).collect();

    let candidates: Vec<Candidate> = extract_ids(text)
        .into_iter()
        .filter_map(|id| by_id.get(&id).copied())
        .take(top_k)
        .enumerate()
        .map(|(position, product)| {
            let penalty = (position as u32 * SCORE_STEP as u32).min(TOP_SCORE as u32) as u8;
            Candidate::from_product(product, Some(TOP_SCORE - penalty), AI_REASON.to_string())
        })
        .collect();

    if candidates.is_empty() && top_k > 0 {
        tracing::warn!(
            response_len = text.len(),
            "No catalog products resolved from ranking response, using fallback"
        );
        return fallback(catalog, top_k);
    }

    RankingOutcome::Ranked(candidates)
}

/// First `top_k` catalog entries in catalog order, unscored
pub fn fallback(catalog: &[ProductRecord], top_k: usize) -> RankingOutcome {
    RankingOutcome::Fallback(
        catalog
            .iter()
            .take(top_k)
            .map(|product| Candidate::from_product(product, None, FALLBACK_REASON.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(ids: &[i64]) -> Vec<ProductRecord> {
        ids.iter()
            .map(|&id| ProductRecord {
                id,
                name: format!("Product {}", id),
                description: String::new(),
                category: "Misc".to_string(),
                price: 5.0,
                image_url: None,
                brand: None,
                reviews_count: None,
            })
            .collect()
    }

    fn ids_and_scores(outcome: &RankingOutcome) -> Vec<(i64, Option<u8>)> {
        outcome
            .candidates()
            .iter()
            .map(|c| (c.id, c.raw_score()))
            .collect()
    }

    #[test]
    fn test_comma_separated_ids() {
        let outcome = parse("3, 17, 42", &catalog(&[42, 17, 3]), 10);

        assert!(!outcome.is_fallback());
        assert_eq!(
            ids_and_scores(&outcome),
            vec![(3, Some(95)), (17, Some(90)), (42, Some(85))]
        );
    }

    #[test]
    fn test_non_numeric_tokens_dropped() {
        let outcome = parse("abc, 5, xyz", &catalog(&[1, 5]), 10);
        assert_eq!(ids_and_scores(&outcome), vec![(5, Some(95))]);
        assert_eq!(outcome.candidates()[0].reason, AI_REASON);
    }

    #[test]
    fn test_no_numeric_tokens_falls_back() {
        let outcome = parse("I would recommend the hat.", &catalog(&[7, 8, 9]), 2);

        assert!(outcome.is_fallback());
        assert_eq!(ids_and_scores(&outcome), vec![(7, None), (8, None)]);
        assert_eq!(outcome.candidates()[0].reason, FALLBACK_REASON);
    }

    #[test]
    fn test_line_separated_ids() {
        let text = "Here are my picks:\n 4 \n2\n1. 3\n4\n";
        assert_eq!(extract_ids(text), vec![4, 2]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(extract_ids("2, 1, 2, 3, 1"), vec![2, 1, 3]);
    }

    #[test]
    fn test_scores_follow_emitted_order_not_response_position() {
        // 99 is not in the catalog, so 2 is the second emitted candidate
        let outcome = parse("1, 99, 2", &catalog(&[1, 2]), 10);
        assert_eq!(ids_and_scores(&outcome), vec![(1, Some(95)), (2, Some(90))]);
    }

    #[test]
    fn test_scores_floor_at_zero() {
        let ids: Vec<i64> = (1..=25).collect();
        let text = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        let outcome = parse(&text, &catalog(&ids), 25);

        let scores: Vec<u8> = outcome.candidates().iter().filter_map(|c| c.raw_score()).collect();
        assert_eq!(scores[19], 0);
        assert_eq!(scores[24], 0);
    }

    #[test]
    fn test_truncated_to_top_k() {
        let outcome = parse("1,2,3,4", &catalog(&[1, 2, 3, 4]), 2);
        assert_eq!(ids_and_scores(&outcome), vec![(1, Some(95)), (2, Some(90))]);
    }

    #[test]
    fn test_unknown_ids_only_falls_back() {
        let outcome = parse("100, 200", &catalog(&[1, 2, 3]), 5);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.candidates().len(), 3);
    }
}
