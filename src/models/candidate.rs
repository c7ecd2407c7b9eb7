use serde::{Deserialize, Serialize};

use super::product::{format_price, ProductRecord};

/// Qualitative bucket derived from a numeric match score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Tier {
    Excellent,
    Good,
    Fair,
    Low,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Tier::Excellent,
            60..=79 => Tier::Good,
            40..=59 => Tier::Fair,
            _ => Tier::Low,
        }
    }
}

/// Match score of a candidate: the raw 0-100 value until it is tiered.
///
/// Serializes as a bare integer or as the tier label, so the same type backs
/// both `search` payloads (raw) and `recommend` payloads (tiered).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MatchScore {
    Raw(u8),
    Tier(Tier),
}

impl MatchScore {
    /// Raw score, `None` once tiered
    pub fn raw(&self) -> Option<u8> {
        match self {
            MatchScore::Raw(score) => Some(*score),
            MatchScore::Tier(_) => None,
        }
    }

    /// Tiering is terminal: an already tiered score is returned unchanged
    pub fn tiered(self) -> Self {
        match self {
            MatchScore::Raw(score) => MatchScore::Tier(Tier::from_score(score)),
            tier => tier,
        }
    }
}

/// Which merge pass placed a candidate into a hybrid response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Source {
    #[serde(rename = "Content-Based")]
    ContentBased,
    #[serde(rename = "Title-Based")]
    TitleBased,
    #[serde(rename = "Additional")]
    Additional,
}

/// A scored recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Always rendered as `"<amount> USD"`
    pub price: String,
    pub category: String,
    pub brand: String,
    pub reviews_count: i64,
    /// `None` for fallback entries the ranking backend never scored
    #[serde(default)]
    pub match_score: Option<MatchScore>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl Candidate {
    /// Builds a candidate from a catalog entry, default-filling brand and review count
    pub fn from_product(product: &ProductRecord, score: Option<u8>, reason: String) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            category: product.category.clone(),
            brand: product.brand_or_default().to_string(),
            reviews_count: product.reviews_or_default(),
            match_score: score.map(MatchScore::Raw),
            reason,
            source: None,
        }
    }

    pub fn raw_score(&self) -> Option<u8> {
        self.match_score.and_then(|s| s.raw())
    }

    pub fn tiered(mut self) -> Self {
        self.match_score = self.match_score.map(MatchScore::tiered);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductRecord {
        ProductRecord {
            id: 42,
            name: "Trail Runner".to_string(),
            description: "Lightweight running shoe".to_string(),
            category: "Footwear".to_string(),
            price: 89.0,
            image_url: Some("https://img.local/42.png".to_string()),
            brand: None,
            reviews_count: None,
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_score(85), Tier::Excellent);
        assert_eq!(Tier::from_score(80), Tier::Excellent);
        assert_eq!(Tier::from_score(79), Tier::Good);
        assert_eq!(Tier::from_score(65), Tier::Good);
        assert_eq!(Tier::from_score(60), Tier::Good);
        assert_eq!(Tier::from_score(45), Tier::Fair);
        assert_eq!(Tier::from_score(40), Tier::Fair);
        assert_eq!(Tier::from_score(39), Tier::Low);
        assert_eq!(Tier::from_score(10), Tier::Low);
        assert_eq!(Tier::from_score(0), Tier::Low);
    }

    #[test]
    fn test_tiering_is_terminal() {
        let once = MatchScore::Raw(65).tiered();
        assert_eq!(once, MatchScore::Tier(Tier::Good));
        assert_eq!(once.tiered(), once);
        assert_eq!(once.raw(), None);
    }

    #[test]
    fn test_from_product_fills_defaults() {
        let candidate = Candidate::from_product(&product(), Some(70), "because".to_string());

        assert_eq!(candidate.price, "89.00 USD");
        assert_eq!(candidate.brand, "Unknown");
        assert_eq!(candidate.reviews_count, 0);
        assert_eq!(candidate.raw_score(), Some(70));
        assert_eq!(candidate.source, None);
    }

    #[test]
    fn test_match_score_serialization() {
        let raw = serde_json::to_string(&MatchScore::Raw(42)).unwrap();
        let tier = serde_json::to_string(&MatchScore::Tier(Tier::Fair)).unwrap();

        assert_eq!(raw, "42");
        assert_eq!(tier, "\"Fair\"");
        assert_eq!(
            serde_json::from_str::<MatchScore>("\"Excellent\"").unwrap(),
            MatchScore::Tier(Tier::Excellent)
        );
    }

    #[test]
    fn test_source_serialization() {
        let candidate = Candidate::from_product(&product(), Some(90), "r".to_string())
            .tiered()
            .with_source(Source::ContentBased);
        let json = serde_json::to_value(&candidate).unwrap();

        assert_eq!(json["source"], "Content-Based");
        assert_eq!(json["match_score"], "Excellent");
        assert_eq!(json["price"], "89.00 USD");
    }

    #[test]
    fn test_unscored_candidate_serializes_null_score() {
        let candidate = Candidate::from_product(&product(), None, "fallback".to_string());
        let json = serde_json::to_value(&candidate).unwrap();

        assert!(json["match_score"].is_null());
        assert!(json.get("source").is_none());
    }
}
