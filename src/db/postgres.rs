use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{error::AppResult, models::ProductRecord, services::catalog::CatalogProvider};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    price: f64,
    image_url: Option<String>,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        // The products table carries no brand or review columns
        ProductRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            image_url: row.image_url,
            brand: None,
            reviews_count: None,
        }
    }
}

/// Catalog provider reading the `products` and `categories` tables
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for PgCatalog {
    async fn list_products(&self) -> AppResult<Vec<ProductRecord>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT p.id::BIGINT AS id,
                   p.name,
                   COALESCE(p.description, '') AS description,
                   COALESCE(c.name, '') AS category,
                   COALESCE(p.price, 0)::FLOAT8 AS price,
                   p.image_url
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), "Loaded catalog snapshot");

        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
