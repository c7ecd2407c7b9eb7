use crate::models::ProductRecord;

/// Products listed in a ranking prompt at most, keeps the prompt size bounded
pub const DEFAULT_CORPUS_LIMIT: usize = 50;

/// Customer preference line derived from a search query
pub fn preferences_for_query(query: &str) -> String {
    format!(
        "Find products similar to '{}'. The customer is looking for products like: {}",
        query, query
    )
}

/// Whole prices keep one decimal place, e.g. `12.0`
fn prompt_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 {
        format!("{:.1}", price)
    } else {
        price.to_string()
    }
}

/// Builds the ranking prompt over the first `corpus_limit` catalog products
pub fn ranking_prompt(preferences: &str, catalog: &[ProductRecord], corpus_limit: usize) -> String {
    let products = catalog
        .iter()
        .take(corpus_limit)
        .enumerate()
        .map(|(i, p)| {
            format!(
                "Product {} (ID: {}): {} - {} - Category: {} - Price: {} - Brand: {}",
                i + 1,
                p.id,
                p.name,
                p.description,
                p.category,
                prompt_price(p.price),
                p.brand_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
You are a personalized product recommendation engine for an e-commerce platform.

Customer preferences: {preferences}

Available products:
{products}

Based on the customer preferences and available products, recommend the most suitable products.
Consider product categories, descriptions, brands, and any specific needs mentioned by the customer.
Rank products from most to least relevant.

Format your answer as a simple comma-separated list of product IDs (numbers only).
Example: 3, 17, 42, 9, 21
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64) -> ProductRecord {
        ProductRecord {
            id,
            name: format!("Item {}", id),
            description: "Sturdy".to_string(),
            category: "Tools".to_string(),
            price: 12.5,
            image_url: None,
            brand: None,
            reviews_count: None,
        }
    }

    #[test]
    fn test_preferences_repeat_query() {
        assert_eq!(
            preferences_for_query("hammer"),
            "Find products similar to 'hammer'. The customer is looking for products like: hammer"
        );
    }

    #[test]
    fn test_prompt_lists_products_up_to_limit() {
        let catalog: Vec<ProductRecord> = (1..=5).map(product).collect();
        let prompt = ranking_prompt("hammer", &catalog, 3);

        assert!(prompt.contains("Customer preferences: hammer"));
        assert!(prompt.contains(
            "Product 1 (ID: 1): Item 1 - Sturdy - Category: Tools - Price: 12.5 - Brand: Unknown"
        ));
        assert!(prompt.contains("Product 3 (ID: 3)"));
        assert!(!prompt.contains("(ID: 4)"));
        assert!(prompt.contains("comma-separated list of product IDs"));
    }

    #[test]
    fn test_whole_prices_keep_decimal_place() {
        let mut whole = product(1);
        whole.price = 12.0;
        let prompt = ranking_prompt("hammer", &[whole], 1);

        assert!(prompt.contains("- Price: 12.0 -"));
        assert_eq!(prompt_price(0.25), "0.25");
        assert_eq!(prompt_price(30.0), "30.0");
    }
}
