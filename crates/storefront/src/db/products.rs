//! Product repository: catalog queries and review aggregate maintenance.
//!
//! The derived fields `ratings` and `number_of_reviews` are only ever
//! written here, inside the same transaction as the review mutation that
//! invalidated them, and always recomputed from the review table as it
//! stands at the end of that mutation. A `version` column backs an
//! optimistic-concurrency check so concurrent review submissions for the
//! same product serialize instead of losing updates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use loomline_core::query::QueryDescriptor;
use loomline_core::{Category, ProductId, RatingSummary, ReviewId, UserId};

use super::query::{push_predicate, push_window};
use super::RepositoryError;
use crate::models::product::{PhotoRef, Product, ProductDraft, Review};

/// Attempts an aggregate update makes before giving up on the optimistic
/// version check.
const MAX_AGGREGATE_ATTEMPTS: u32 = 5;

const PRODUCT_COLUMNS: &str = "id, name, price, description, category, stock, brand, \
     ratings, number_of_reviews, owner_id, created_at";

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    description: String,
    category: String,
    stock: i32,
    brand: String,
    ratings: Decimal,
    number_of_reviews: i64,
    owner_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PhotoRow {
    product_id: i64,
    media_id: String,
    url: String,
}

#[derive(FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    reviewer_name: String,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, photos: Vec<PhotoRef>) -> Result<Product, RepositoryError> {
        let category = self.category.parse::<Category>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            description: self.description,
            photos,
            category,
            stock: self.stock,
            brand: self.brand,
            ratings: self.ratings,
            number_of_reviews: self.number_of_reviews,
            owner_id: UserId::new(self.owner_id),
            created_at: self.created_at,
        })
    }
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            user_id: UserId::new(row.user_id),
            reviewer_name: row.reviewer_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
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

    /// Total number of products in the catalog, ignoring any filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of products matching the descriptor's predicate.
    ///
    /// The pagination window is ignored; only the search and filter stages
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when a filter referenced a field the schema does not have.
    pub async fn count(&self, query: &QueryDescriptor) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product");
        push_predicate(&mut builder, query);

        let count: i64 = builder.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// List products matching the descriptor, windowed and in descriptor
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when a filter referenced a field the schema does not have.
    pub async fn list(&self, query: &QueryDescriptor) -> Result<Vec<Product>, RepositoryError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM product"));
        push_predicate(&mut builder, query);
        push_window(&mut builder, query);

        let rows: Vec<ProductRow> = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        self.assemble(rows).await
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn find(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        let photos = self.photos_for(id).await?;
        row.into_product(photos)
    }

    /// All reviews for a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn reviews(&self, id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        let rows: Vec<ReviewRow> = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, reviewer_name, rating, comment, created_at \
             FROM review WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Create a product with its resolved photo references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(
        &self,
        owner: UserId,
        draft: &ProductDraft,
        photos: &[PhotoRef],
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO product (name, price, description, category, stock, brand, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(draft.category.as_str())
        .bind(draft.stock)
        .bind(&draft.brand)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        insert_photos(&mut tx, row.id, photos).await?;
        tx.commit().await?;

        row.into_product(photos.to_vec())
    }

    /// Replace a product's own fields, and its photos when new ones are
    /// provided.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        photos: Option<&[PhotoRef]>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE product \
             SET name = $1, price = $2, description = $3, category = $4, stock = $5, brand = $6 \
             WHERE id = $7 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(draft.category.as_str())
        .bind(draft.stock)
        .bind(&draft.brand)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;

        if let Some(photos) = photos {
            sqlx::query("DELETE FROM product_photo WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_photos(&mut tx, id.as_i64(), photos).await?;
        }

        tx.commit().await?;

        let photos = self.photos_for(id).await?;
        row.into_product(photos)
    }

    /// Delete a product, returning its last state so callers can clean up
    /// its photos in media storage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let product = self.find(id).await?;

        sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(product)
    }

    /// Submit a review: insert for a new reviewer, replace in place for a
    /// returning one, then recompute the product's derived rating fields
    /// from the resulting review list.
    ///
    /// Retries on a lost optimistic check so concurrent submissions for
    /// the same product all land.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if concurrent writers kept winning the
    /// version check.
    pub async fn submit_review(
        &self,
        product_id: ProductId,
        reviewer: UserId,
        reviewer_name: &str,
        rating: i32,
        comment: &str,
    ) -> Result<RatingSummary, RepositoryError> {
        for _ in 0..MAX_AGGREGATE_ATTEMPTS {
            match self
                .try_submit_review(product_id, reviewer, reviewer_name, rating, comment)
                .await
            {
                Err(RepositoryError::Conflict(_)) => {}
                other => return other,
            }
        }

        Err(RepositoryError::Conflict(
            "review aggregates kept changing concurrently".to_owned(),
        ))
    }

    /// Remove a reviewer's review and recompute the derived rating fields
    /// from the post-removal review list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist
    /// or the reviewer has no review on it.
    pub async fn delete_review(
        &self,
        product_id: ProductId,
        reviewer: UserId,
    ) -> Result<RatingSummary, RepositoryError> {
        for _ in 0..MAX_AGGREGATE_ATTEMPTS {
            match self.try_delete_review(product_id, reviewer).await {
                Err(RepositoryError::Conflict(_)) => {}
                other => return other,
            }
        }

        Err(RepositoryError::Conflict(
            "review aggregates kept changing concurrently".to_owned(),
        ))
    }

    async fn try_submit_review(
        &self,
        product_id: ProductId,
        reviewer: UserId,
        reviewer_name: &str,
        rating: i32,
        comment: &str,
    ) -> Result<RatingSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let version = product_version(&mut tx, product_id).await?;

        sqlx::query(
            "INSERT INTO review (product_id, user_id, reviewer_name, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (product_id, user_id) \
             DO UPDATE SET reviewer_name = EXCLUDED.reviewer_name, \
                           rating = EXCLUDED.rating, \
                           comment = EXCLUDED.comment",
        )
        .bind(product_id)
        .bind(reviewer)
        .bind(reviewer_name)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await?;

        let summary = store_aggregates(&mut tx, product_id, version).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn try_delete_review(
        &self,
        product_id: ProductId,
        reviewer: UserId,
    ) -> Result<RatingSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let version = product_version(&mut tx, product_id).await?;

        let removed = sqlx::query("DELETE FROM review WHERE product_id = $1 AND user_id = $2")
            .bind(product_id)
            .bind(reviewer)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let summary = store_aggregates(&mut tx, product_id, version).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn photos_for(&self, id: ProductId) -> Result<Vec<PhotoRef>, RepositoryError> {
        let rows: Vec<PhotoRow> = sqlx::query_as::<_, PhotoRow>(
            "SELECT product_id, media_id, url FROM product_photo \
             WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PhotoRef {
                id: row.media_id,
                url: row.url,
            })
            .collect())
    }

    /// Attach photos to a page of product rows with a single query.
    async fn assemble(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let photo_rows: Vec<PhotoRow> = sqlx::query_as::<_, PhotoRow>(
            "SELECT product_id, media_id, url FROM product_photo \
             WHERE product_id = ANY($1) ORDER BY position, id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<PhotoRef>> = HashMap::new();
        for row in photo_rows {
            by_product.entry(row.product_id).or_default().push(PhotoRef {
                id: row.media_id,
                url: row.url,
            });
        }

        rows.into_iter()
            .map(|row| {
                let photos = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(photos)
            })
            .collect()
    }
}

/// Read the product's current version inside the transaction.
async fn product_version(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<i64, RepositoryError> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM product WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

    version.ok_or(RepositoryError::NotFound)
}

/// Recompute the derived rating fields from the review list as it stands
/// in this transaction and persist them behind the optimistic check.
async fn store_aggregates(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    expected_version: i64,
) -> Result<RatingSummary, RepositoryError> {
    let ratings: Vec<i32> = sqlx::query_scalar("SELECT rating FROM review WHERE product_id = $1")
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await?;

    let summary = RatingSummary::from_ratings(&ratings);

    let updated = sqlx::query(
        "UPDATE product \
         SET ratings = $1, number_of_reviews = $2, version = version + 1 \
         WHERE id = $3 AND version = $4",
    )
    .bind(summary.average)
    .bind(summary.count)
    .bind(product_id)
    .bind(expected_version)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(
            "product review aggregates changed concurrently".to_owned(),
        ));
    }

    Ok(summary)
}

async fn insert_photos(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    photos: &[PhotoRef],
) -> Result<(), RepositoryError> {
    for (position, photo) in photos.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_photo (product_id, media_id, url, position) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&photo.id)
        .bind(&photo.url)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
