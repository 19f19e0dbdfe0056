//! Catalog route handlers: listing, detail, reviews, and admin CRUD.
//!
//! The public listing is the query-builder surface: the raw query-string
//! map goes through the core descriptor stages and the repository renders
//! the result. Handlers never assemble SQL.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomline_core::query::QueryDescriptor;
use loomline_core::{Capability, Category, ProductId, RatingSummary};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::{RequireAuth, authorize};
use crate::models::product::{PhotoRef, Product, ProductDraft, Review};
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Create/update request body for a product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: Category,
    pub stock: i32,
    pub brand: String,
    /// Source URLs to pull into media storage. Required on create;
    /// omitted on update to keep the existing photos.
    pub photos: Option<Vec<String>>,
}

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub rating: i32,
    pub comment: String,
}

/// Review deletion query (`DELETE /review?productId=…`).
#[derive(Debug, Deserialize)]
pub struct DeleteReviewQuery {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
}

/// Review listing query (`GET /reviews?id=…`).
#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub id: ProductId,
}

/// Paged catalog listing.
#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
    /// Catalog size before any filtering.
    pub total_products: i64,
    /// Matching set size before pagination.
    pub filtered_products: i64,
}

/// One product with its reviews.
#[derive(Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// Review list for a product.
#[derive(Serialize)]
pub struct ReviewListResponse {
    pub success: bool,
    pub reviews: Vec<Review>,
}

/// Result of a review mutation: the recomputed aggregates.
#[derive(Serialize)]
pub struct ReviewSummaryResponse {
    pub success: bool,
    pub ratings: Decimal,
    pub number_of_reviews: i64,
}

impl From<RatingSummary> for ReviewSummaryResponse {
    fn from(summary: RatingSummary) -> Self {
        Self {
            success: true,
            ratings: summary.average,
            number_of_reviews: summary.count,
        }
    }
}

// =============================================================================
// Public Catalog
// =============================================================================

/// Catalog listing with search, filters, and pagination.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ProductListResponse>> {
    let repo = ProductRepository::new(state.pool());

    let base = QueryDescriptor::build(&params)?;
    let total_products = repo.count_all().await?;
    let filtered_products = repo.count(&base).await?;

    let paged = base.paginate(state.config().products_per_page, &params);
    let products = repo.list(&paged).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
        total_products,
        filtered_products,
    }))
}

/// One product, with its reviews.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>> {
    let repo = ProductRepository::new(state.pool());
    let id = ProductId::new(id);

    let product = repo
        .find(id)
        .await
        .map_err(or_not_found("no product found with this id"))?;
    let reviews = repo.reviews(id).await?;

    Ok(Json(ProductResponse {
        success: true,
        product,
        reviews,
    }))
}

/// Reviews for a product.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ReviewListResponse>> {
    let reviews = ProductRepository::new(state.pool())
        .reviews(query.id)
        .await
        .map_err(or_not_found("no product found with this id"))?;

    Ok(Json(ReviewListResponse {
        success: true,
        reviews,
    }))
}

/// Submit (or replace) the logged-in user's review of a product.
pub async fn submit_review(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<SubmitReviewRequest>,
) -> Result<Json<ReviewSummaryResponse>> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_owned(),
        ));
    }

    let summary = ProductRepository::new(state.pool())
        .submit_review(
            body.product_id,
            current.id,
            &current.name,
            body.rating,
            &body.comment,
        )
        .await
        .map_err(or_not_found("no product found with this id"))?;

    Ok(Json(summary.into()))
}

/// Delete the logged-in user's review of a product.
pub async fn delete_review(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<DeleteReviewQuery>,
) -> Result<Json<ReviewSummaryResponse>> {
    let summary = ProductRepository::new(state.pool())
        .delete_review(query.product_id, current.id)
        .await
        .map_err(or_not_found("no review by this user on this product"))?;

    Ok(Json(summary.into()))
}

// =============================================================================
// Admin Catalog
// =============================================================================

/// Admin: every product, unfiltered.
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ProductListResponse>> {
    authorize(&current, Capability::ManageCatalog)?;

    let repo = ProductRepository::new(state.pool());
    let products = repo.list(&QueryDescriptor::default()).await?;
    let total_products = repo.count_all().await?;

    Ok(Json(ProductListResponse {
        success: true,
        filtered_products: total_products,
        total_products,
        products,
    }))
}

/// Admin: add a product.
///
/// Photos are staged into media storage first; if the record insert fails,
/// the staged uploads are destroyed again.
pub async fn admin_add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<ProductForm>,
) -> Result<Json<ProductResponse>> {
    authorize(&current, Capability::ManageCatalog)?;

    let draft = validate_form(&body)?;
    let photo_sources = body
        .photos
        .as_deref()
        .filter(|photos| !photos.is_empty())
        .ok_or_else(|| {
            AppError::Validation("at least one product photo is required".to_owned())
        })?;

    let staged = stage_photos(&state, photo_sources).await?;

    let repo = ProductRepository::new(state.pool());
    let product = match repo.create(current.id, &draft, &staged).await {
        Ok(product) => product,
        Err(err) => {
            state.media().destroy_best_effort(&staged).await;
            return Err(err.into());
        }
    };

    Ok(Json(ProductResponse {
        success: true,
        product,
        reviews: Vec::new(),
    }))
}

/// Admin: update a product.
///
/// New photos replace the old set: stage the new uploads, commit the
/// record, then destroy the replaced images best effort.
pub async fn admin_update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<ProductForm>,
) -> Result<Json<ProductResponse>> {
    authorize(&current, Capability::ManageCatalog)?;

    let id = ProductId::new(id);
    let draft = validate_form(&body)?;

    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .find(id)
        .await
        .map_err(or_not_found("no product found with this id"))?;

    let staged = match body.photos.as_deref() {
        Some(sources) => Some(stage_photos(&state, sources).await?),
        None => None,
    };

    let update = repo.update(id, &draft, staged.as_deref()).await;
    let product = match update {
        Ok(product) => product,
        Err(err) => {
            if let Some(staged) = staged {
                state.media().destroy_best_effort(&staged).await;
            }
            return Err(or_not_found("no product found with this id")(err));
        }
    };

    if staged.is_some() {
        state.media().destroy_best_effort(&existing.photos).await;
    }

    let reviews = repo.reviews(id).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
        reviews,
    }))
}

/// Admin: delete a product and its stored images.
pub async fn admin_delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    authorize(&current, Capability::ManageCatalog)?;

    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
        .map_err(or_not_found("no product found with this id"))?;

    // The record is gone; image cleanup is best effort.
    state.media().destroy_best_effort(&deleted.photos).await;

    Ok(Json(MessageResponse {
        success: true,
        message: "product deleted".to_owned(),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Check the form fields and produce the repository draft.
fn validate_form(form: &ProductForm) -> Result<ProductDraft> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".to_owned()));
    }
    if form.description.trim().is_empty() {
        return Err(AppError::Validation(
            "product description is required".to_owned(),
        ));
    }
    if form.brand.trim().is_empty() {
        return Err(AppError::Validation("product brand is required".to_owned()));
    }
    if form.price < Decimal::ZERO {
        return Err(AppError::Validation(
            "product price cannot be negative".to_owned(),
        ));
    }
    if form.stock < 0 {
        return Err(AppError::Validation(
            "product stock cannot be negative".to_owned(),
        ));
    }

    Ok(ProductDraft {
        name: form.name.clone(),
        price: form.price,
        description: form.description.clone(),
        category: form.category,
        stock: form.stock,
        brand: form.brand.clone(),
    })
}

/// Upload every source URL, destroying the partial batch if one fails.
async fn stage_photos(state: &AppState, sources: &[String]) -> Result<Vec<PhotoRef>> {
    let folder = state.media().product_folder().to_owned();
    let mut staged = Vec::with_capacity(sources.len());

    for source_url in sources {
        match state.media().upload(source_url, &folder).await {
            Ok(photo) => staged.push(photo),
            Err(err) => {
                state.media().destroy_best_effort(&staged).await;
                return Err(err.into());
            }
        }
    }

    Ok(staged)
}
