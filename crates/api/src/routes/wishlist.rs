//! Wishlist routes. All require authentication.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use avoi_core::ProductId;

use crate::db::{CatalogRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, DisplayCurrency};
use crate::models::WishlistEntryView;
use crate::state::AppState;

/// GET /api/wishlist
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Value>> {
    let repo = WishlistRepository::new(state.pool());
    let rate = state.currency().rate_for(&currency).await;

    let entries = repo.list_for_user(user.id).await?;
    let items: Vec<WishlistEntryView> = entries
        .into_iter()
        .map(|entry| WishlistEntryView::price(entry, rate, currency.clone()))
        .collect();

    Ok(Json(json!({
        "wishlist": items,
        "currency": currency,
    })))
}

/// Add-to-wishlist request body.
#[derive(Debug, Deserialize)]
pub struct AddWishlistRequest {
    pub product_id: i32,
}

/// POST /api/wishlist
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddWishlistRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let catalog = CatalogRepository::new(state.pool());
    let repo = WishlistRepository::new(state.pool());

    let product = catalog
        .get_active_product(ProductId::new(request.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    let item = repo.add(user.id, product.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product added to wishlist",
            "item": item,
        })),
    ))
}

/// DELETE /api/wishlist/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i32>,
) -> Result<Json<Value>> {
    let repo = WishlistRepository::new(state.pool());
    repo.remove(user.id, ProductId::new(product_id)).await?;

    Ok(Json(json!({ "message": "Product removed from wishlist" })))
}
