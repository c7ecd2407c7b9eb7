use crate::{error::AppResult, models::ProductRecord};

/// Source of the catalog snapshot a request ranks against
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Lists every product in catalog order
    async fn list_products(&self) -> AppResult<Vec<ProductRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Fixed catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<ProductRecord>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn list_products(&self) -> AppResult<Vec<ProductRecord>> {
        Ok(self.products.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
