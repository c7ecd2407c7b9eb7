use serde::{Deserialize, Serialize};

/// Brand reported for products whose catalog entry carries none
pub const UNKNOWN_BRAND: &str = "Unknown";

/// Catalog snapshot entry as supplied by the catalog provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Category name
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub reviews_count: Option<i64>,
}

impl ProductRecord {
    /// Text the similarity index is built from
    pub fn document(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.category)
    }

    /// Brand with the catalog-wide default applied
    pub fn brand_or_default(&self) -> &str {
        self.brand
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(UNKNOWN_BRAND)
    }

    pub fn reviews_or_default(&self) -> i64 {
        self.reviews_count.unwrap_or(0)
    }
}

/// Renders a price the way every response payload carries it
pub fn format_price(amount: f64) -> String {
    format!("{:.2} USD", amount)
}
