//! Catalog routes: products, categories, reviews.
//!
//! Prices are converted into the display currency from the `X-Currency`
//! header (default USD). Price filters arrive in the display currency
//! and are converted back to the base currency for the query.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use avoi_core::{CategoryId, ProductId};

use crate::db::catalog::{ProductFilter, ProductSort};
use crate::db::{CatalogRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, DisplayCurrency};
use crate::models::{CategoryNode, ProductView, ReviewStats};
use crate::routes::{PageParams, Pagination};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

const REVIEW_PAGE_SIZE: i64 = 10;
const MAX_REVIEW_PAGE_SIZE: i64 = 50;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category_id: Option<i32>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
}

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let catalog = CatalogRepository::new(state.pool());
    let rate = state.currency().rate_for(&currency).await;

    let page_params = PageParams {
        page: params.page,
        per_page: params.per_page,
    };
    let (page, per_page) = page_params.clamp(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    // Price bounds come in the display currency; the catalog stores base
    // currency prices.
    let filter = ProductFilter {
        category_id: params.category_id.map(CategoryId::new),
        search: params.search.as_deref().filter(|s| !s.is_empty()),
        min_price: params.min_price.map(|p| p / rate),
        max_price: params.max_price.map(|p| p / rate),
        sort: ProductSort::from_param(params.sort_by.as_deref()),
    };

    let (products, total) = catalog
        .search_products(&filter, per_page, PageParams::offset(page, per_page))
        .await?;

    let mut views = Vec::with_capacity(products.len());
    for product in products {
        let images = catalog.images_for_product(product.id).await?;
        let variants = catalog.variants_for_product(product.id).await?;
        views.push(ProductView::from_product(
            product,
            images,
            variants,
            rate,
            currency.clone(),
        ));
    }

    Ok(Json(json!({
        "products": views,
        "pagination": Pagination::new(page, per_page, total),
        "currency": currency,
    })))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let catalog = CatalogRepository::new(state.pool());
    let reviews = ReviewRepository::new(state.pool());

    let product = catalog
        .get_active_product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    let rate = state.currency().rate_for(&currency).await;
    let images = catalog.images_for_product(product.id).await?;
    let variants = catalog.variants_for_product(product.id).await?;

    // Most recent approved reviews accompany the detail page.
    let (recent_reviews, _) = reviews
        .page_for_product(product.id, None, REVIEW_PAGE_SIZE, 0)
        .await?;

    let view = ProductView::from_product(product, images, variants, rate, currency.clone());

    Ok(Json(json!({
        "product": view,
        "reviews": recent_reviews,
        "currency": currency,
    })))
}

/// GET /api/products/categories
///
/// Returns active categories as a nested tree.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let catalog = CatalogRepository::new(state.pool());
    let flat = catalog.list_active_categories().await?;
    let tree = CategoryNode::build_tree(flat);

    Ok(Json(json!({ "categories": tree })))
}

/// GET /api/products/categories/{id}/products
pub async fn category_products(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<i32>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>> {
    let catalog = CatalogRepository::new(state.pool());

    let category = catalog
        .get_category(CategoryId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("category".to_owned()))?;

    let rate = state.currency().rate_for(&currency).await;
    let (page, per_page) = params.clamp(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let filter = ProductFilter {
        category_id: Some(category.id),
        ..ProductFilter::default()
    };

    let (products, total) = catalog
        .search_products(&filter, per_page, PageParams::offset(page, per_page))
        .await?;

    let mut views = Vec::with_capacity(products.len());
    for product in products {
        let images = catalog.images_for_product(product.id).await?;
        let variants = catalog.variants_for_product(product.id).await?;
        views.push(ProductView::from_product(
            product,
            images,
            variants,
            rate,
            currency.clone(),
        ));
    }

    Ok(Json(json!({
        "category": category,
        "products": views,
        "pagination": Pagination::new(page, per_page, total),
        "currency": currency,
    })))
}

/// Query parameters for review listings.
#[derive(Debug, Deserialize)]
pub struct ReviewParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub rating: Option<i32>,
}

/// GET /api/products/{id}/reviews
///
/// Statistics cover ALL approved reviews for the product, independent of
/// the page and rating filter being displayed.
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Value>> {
    let catalog = CatalogRepository::new(state.pool());
    let reviews = ReviewRepository::new(state.pool());

    let product = catalog
        .get_active_product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    let page_params = PageParams {
        page: params.page,
        per_page: params.per_page,
    };
    let (page, per_page) = page_params.clamp(REVIEW_PAGE_SIZE, MAX_REVIEW_PAGE_SIZE);

    let (page_of_reviews, total) = reviews
        .page_for_product(
            product.id,
            params.rating,
            per_page,
            PageParams::offset(page, per_page),
        )
        .await?;

    let counts = reviews.rating_counts(product.id).await?;
    let statistics = ReviewStats::from_counts(&counts);

    Ok(Json(json!({
        "reviews": page_of_reviews,
        "pagination": Pagination::new(page, per_page, total),
        "statistics": statistics,
    })))
}

/// Review creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
}

/// POST /api/products/{id}/reviews
///
/// One review per (user, product); the unique constraint is the
/// authoritative duplicate check, the pre-check just gives a clearer
/// message.
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_owned(),
        ));
    }

    let catalog = CatalogRepository::new(state.pool());
    let reviews = ReviewRepository::new(state.pool());

    let product = catalog
        .get_active_product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    if reviews.exists_for(product.id, user.id).await? {
        return Err(AppError::BadRequest(
            "you have already reviewed this product".to_owned(),
        ));
    }

    let review = reviews
        .create(
            product.id,
            user.id,
            request.rating,
            request.title.as_deref(),
            Some(&request.comment),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review created successfully",
            "review": review,
        })),
    ))
}
