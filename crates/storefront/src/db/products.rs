//! Product repository.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hearth_core::catalog::{Product, ProductFilter, SortOrder};
use hearth_core::{PowerLevel, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::views::NewView;
use super::{RepositoryError, like_pattern};

const PRODUCT_COLUMNS: &str = "id, article, name, description, price, category, image_url, \
     specifications, in_stock, stock_quantity, views_count, updated_at";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: ProductId,
    article: Option<String>,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    image_url: Option<String>,
    specifications: Json<Value>,
    in_stock: bool,
    stock_quantity: i32,
    views_count: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let specifications = match row.specifications.0 {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect(),
            Value::Null => BTreeMap::new(),
            other => {
                return Err(RepositoryError::DataCorruption(format!(
                    "product {} specifications are not an object: {other}",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: row.id,
            article: row.article,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            specifications,
            in_stock: row.in_stock,
            stock_quantity: row.stock_quantity,
            views_count: row.views_count,
            updated_at: Some(row.updated_at),
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// A normalized catalog row ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub article: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub power: Option<String>,
    pub contours: Option<String>,
    pub wifi: Option<String>,
    pub power_level: PowerLevel,
}

/// Partial product update from the admin API. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub in_stock: Option<bool>,
    pub stock_quantity: Option<i32>,
}

impl ProductUpdate {
    /// Reject values the schema would refuse anyway.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("name cannot be empty");
        }
        if self.price.is_some_and(|p| p < Decimal::ZERO) {
            return Err("price cannot be negative");
        }
        if self.stock_quantity.is_some_and(|q| q < 0) {
            return Err("stock_quantity cannot be negative");
        }
        Ok(())
    }
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CatalogStats {
    pub products_count: i64,
    pub in_stock_count: i64,
    pub views_today: i64,
    pub views_total: i64,
    /// Most recent product write, i.e. the last sync or admin edit.
    pub last_sync: Option<DateTime<Utc>>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, in its sort order.
    ///
    /// Search is a case-insensitive substring match over name and description.
    /// Price bounds are inclusive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE TRUE"
        ));

        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            query.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            query
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if filter.in_stock_only {
            query.push(" AND in_stock");
        }
        if let Some(min) = filter.min_price {
            query.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND price <= ").push_bind(max);
        }

        query.push(match filter.sort {
            SortOrder::Default => " ORDER BY id",
            SortOrder::PriceAsc => " ORDER BY price ASC, id",
            SortOrder::PriceDesc => " ORDER BY price DESC, id",
            SortOrder::Name => " ORDER BY LOWER(name), id",
            SortOrder::Popularity => " ORDER BY views_count DESC, id",
        });

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(self.pool).await?;
        into_products(rows)
    }

    /// Get a product by id without touching its view counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Distinct non-empty categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            "SELECT DISTINCT category FROM catalog.product WHERE category <> '' ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// In-stock products sharing `product`'s category, most viewed first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn same_category(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product \
             WHERE category = $1 AND id <> $2 AND in_stock \
             ORDER BY views_count DESC, id LIMIT $3"
        ))
        .bind(&product.category)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        into_products(rows)
    }

    /// Increment a product's view counter and log the view, atomically.
    ///
    /// Returns the product with the new counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, view), fields(product_id = %id))]
    pub async fn record_view(
        &self,
        id: ProductId,
        view: &NewView,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE catalog.product SET views_count = views_count + 1 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            "INSERT INTO catalog.product_view (product_id, session_id, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(view.session_id.as_ref().map(|s| s.as_str().to_string()))
        .bind(view.user_agent.as_deref())
        .bind(view.ip_address.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Product::try_from(row)
    }

    /// Apply an admin update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE catalog.product SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                category = COALESCE($5, category), \
                image_url = COALESCE($6, image_url), \
                specifications = COALESCE($7, specifications), \
                in_stock = COALESCE($8, in_stock), \
                stock_quantity = COALESCE($9, stock_quantity), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.category.as_deref())
        .bind(update.image_url.as_deref())
        .bind(update.specifications.as_ref().map(Json))
        .bind(update.in_stock)
        .bind(update.stock_quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::NotFound), Product::try_from)
    }

    /// Delete a product and its view log.
    ///
    /// Returns how many view rows went with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let views = sqlx::query("DELETE FROM catalog.product_view WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(views)
    }

    /// Replace the catalog with `products` in one transaction.
    ///
    /// Rows are matched on article: known articles keep their id and view
    /// counter, articles missing from `products` are deleted (with their
    /// views), rows without an article are always recreated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on duplicate articles.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    #[instrument(skip_all, fields(count = products.len()))]
    pub async fn replace_all(&self, products: &[NewProduct]) -> Result<usize, RepositoryError> {
        let articles: Vec<String> = products.iter().filter_map(|p| p.article.clone()).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM catalog.product WHERE article IS NULL OR article <> ALL($1)",
        )
        .bind(&articles)
        .execute(&mut *tx)
        .await?;

        for product in products {
            sqlx::query(
                "INSERT INTO catalog.product \
                    (article, name, description, price, category, image_url, specifications, \
                     in_stock, stock_quantity, power, contours, wifi, power_level) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
                 ON CONFLICT (article) DO UPDATE SET \
                    name = EXCLUDED.name, \
                    description = EXCLUDED.description, \
                    price = EXCLUDED.price, \
                    category = EXCLUDED.category, \
                    image_url = EXCLUDED.image_url, \
                    specifications = EXCLUDED.specifications, \
                    in_stock = EXCLUDED.in_stock, \
                    stock_quantity = EXCLUDED.stock_quantity, \
                    power = EXCLUDED.power, \
                    contours = EXCLUDED.contours, \
                    wifi = EXCLUDED.wifi, \
                    power_level = EXCLUDED.power_level, \
                    updated_at = NOW()",
            )
            .bind(product.article.as_deref())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.category)
            .bind(product.image_url.as_deref())
            .bind(Json(&product.specifications))
            .bind(product.in_stock)
            .bind(product.stock_quantity)
            .bind(product.power.as_deref())
            .bind(product.contours.as_deref())
            .bind(product.wifi.as_deref())
            .bind(product.power_level.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "article"))?;
        }

        tx.commit().await?;
        Ok(products.len())
    }

    /// Dashboard counters. "Today" starts at midnight UTC of `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<CatalogStats, RepositoryError> {
        let stats = sqlx::query_as(
            "SELECT \
                (SELECT COUNT(*) FROM catalog.product) AS products_count, \
                (SELECT COUNT(*) FROM catalog.product WHERE in_stock) AS in_stock_count, \
                (SELECT COUNT(*) FROM catalog.product_view WHERE viewed_at >= $1) AS views_today, \
                (SELECT COUNT(*) FROM catalog.product_view) AS views_total, \
                (SELECT MAX(updated_at) FROM catalog.product) AS last_sync",
        )
        .bind(super::start_of_day(now))
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
