//! Cart routes. All require authentication; cart pricing always uses the
//! owner's preferred currency.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use avoi_core::{CartItemId, VariantId};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::CartService;
use crate::state::AppState;

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool());
    let rate = state.currency().rate_for(&user.preferred_currency).await;

    let totals = cart
        .totals(user.id, rate, user.preferred_currency.clone())
        .await?;

    Ok(Json(json!({
        "cart_items": totals.lines,
        "subtotal": totals.subtotal,
        "currency": totals.currency,
        "item_count": totals.lines.len(),
    })))
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_variant_id: i32,
    pub quantity: i32,
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let cart = CartService::new(state.pool());

    let item = cart
        .add(
            user.id,
            VariantId::new(request.product_variant_id),
            request.quantity,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Item added to cart successfully",
            "item": item,
        })),
    ))
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// PUT /api/cart/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool());
    cart.update(user.id, CartItemId::new(id), request.quantity)
        .await?;

    Ok(Json(json!({ "message": "Cart item updated successfully" })))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool());
    cart.remove(user.id, CartItemId::new(id)).await?;

    Ok(Json(json!({ "message": "Item removed from cart successfully" })))
}

/// DELETE /api/cart/clear
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool());
    cart.clear(user.id).await?;

    Ok(Json(json!({ "message": "Cart cleared successfully" })))
}

/// GET /api/cart/count
pub async fn count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool());
    let count = cart.count(user.id).await?;

    Ok(Json(json!({ "count": count })))
}
