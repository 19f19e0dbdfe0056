//! Product and review domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomline_core::{Category, ProductId, ReviewId, UserId};

/// A reference to an image held in external media storage.
///
/// The storefront only ever stores the resolved reference; upload and
/// deletion happen through the media service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Media-storage identifier, used for deletion.
    pub id: String,
    /// Public URL for display.
    pub url: String,
}

/// A catalog product.
///
/// `ratings` and `number_of_reviews` are derived from the review list and
/// are only ever written by the review aggregate maintenance in the
/// repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub photos: Vec<PhotoRef>,
    pub category: Category,
    pub stock: i32,
    pub brand: String,
    /// Mean review rating, derived.
    pub ratings: Decimal,
    /// Review count, derived.
    pub number_of_reviews: i64,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A product review.
///
/// At most one review exists per (product, reviewer); resubmission replaces
/// the earlier review in place.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    /// Reviewer display name, denormalized at write time.
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a product's own fields.
///
/// Photos are handled separately because they pass through the media
/// service before the record is written.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: Category,
    pub stock: i32,
    pub brand: String,
}
