//! Order routes and the address sub-resource. All require authentication.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use avoi_core::{AddressId, AddressKind, OrderId, OrderStatus, Price};

use crate::db::addresses::{AddressUpdate, NewAddress};
use crate::db::{AddressRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Address, Order, OrderItem, Payment, User};
use crate::routes::{PageParams, Pagination};
use crate::services::orders::PlaceOrder;
use crate::services::{EmailService, OrderService};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

/// An order with its line items, addresses, and payment records.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub payments: Vec<Payment>,
}

async fn load_detail(state: &AppState, user: &User, order: Order) -> Result<OrderDetail> {
    let orders = OrderRepository::new(state.pool());
    let addresses = AddressRepository::new(state.pool());

    let items = orders.items_for_order(order.id).await?;
    let payments = orders.payments_for_order(order.id).await?;
    let shipping_address = addresses.get_owned(order.shipping_address_id, user.id).await?;
    let billing_address = addresses.get_owned(order.billing_address_id, user.id).await?;

    Ok(OrderDetail {
        order,
        items,
        shipping_address,
        billing_address,
        payments,
    })
}

/// Query parameters for the order listing.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());

    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let page_params = PageParams {
        page: params.page,
        per_page: params.per_page,
    };
    let (page, per_page) = page_params.clamp(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let (page_of_orders, total) = orders
        .list_for_user(user.id, status, per_page, PageParams::offset(page, per_page))
        .await?;

    Ok(Json(json!({
        "orders": page_of_orders,
        "pagination": Pagination::new(page, per_page, total),
    })))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_owned(OrderId::new(id), user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    let detail = load_detail(&state, &user, order).await?;
    Ok(Json(json!({ "order": detail })))
}

/// Order placement request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address_id: i32,
    pub billing_address_id: i32,
    pub shipping_cost: Option<Decimal>,
    pub payment_method: Option<String>,
}

/// POST /api/orders
///
/// Places an order from the caller's cart. The confirmation email is
/// dispatched in the background after the transaction commits.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let service = OrderService::new(state.pool(), state.currency());

    let order = service
        .place_order(
            &user,
            PlaceOrder {
                shipping_address_id: AddressId::new(request.shipping_address_id),
                billing_address_id: AddressId::new(request.billing_address_id),
                shipping_cost: request.shipping_cost,
                payment_method: request.payment_method,
            },
        )
        .await?;

    send_confirmation_in_background(state.email().clone(), user.clone(), &order);

    let detail = load_detail(&state, &user, order).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "order": detail,
        })),
    ))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let service = OrderService::new(state.pool(), state.currency());
    let order = service.cancel_order(&user, OrderId::new(id)).await?;

    let detail = load_detail(&state, &user, order).await?;
    Ok(Json(json!({
        "message": "Order cancelled successfully",
        "order": detail,
    })))
}

/// GET /api/orders/{id}/status
pub async fn status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let service = OrderService::new(state.pool(), state.currency());
    let (order, history) = service.order_status(&user, OrderId::new(id)).await?;

    Ok(Json(json!({
        "order_id": order.id,
        "current_status": order.status,
        "payment_status": order.payment_status,
        "status_history": history,
    })))
}

// =============================================================================
// Addresses
// =============================================================================

/// GET /api/orders/addresses
pub async fn addresses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let repo = AddressRepository::new(state.pool());
    let addresses = repo.list_for_user(user.id).await?;

    Ok(Json(json!({ "addresses": addresses })))
}

/// Address creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub address_type: AddressKind,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

/// POST /api/orders/addresses
pub async fn create_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let repo = AddressRepository::new(state.pool());

    let address = repo
        .create(
            user.id,
            NewAddress {
                kind: request.address_type,
                street_address: &request.street_address,
                city: &request.city,
                state: &request.state,
                postal_code: &request.postal_code,
                country: &request.country,
                is_default: request.is_default,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Address created successfully",
            "address": address,
        })),
    ))
}

/// Address update request body; absent fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// PUT /api/orders/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Json<Value>> {
    let repo = AddressRepository::new(state.pool());

    let address = repo
        .update(
            AddressId::new(id),
            user.id,
            AddressUpdate {
                street_address: request.street_address.as_deref(),
                city: request.city.as_deref(),
                state: request.state.as_deref(),
                postal_code: request.postal_code.as_deref(),
                country: request.country.as_deref(),
                make_default: request.is_default,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "Address updated successfully",
        "address": address,
    })))
}

/// DELETE /api/orders/addresses/{id}
///
/// Refused while any order references the address.
pub async fn delete_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let repo = AddressRepository::new(state.pool());
    repo.delete(AddressId::new(id), user.id).await?;

    Ok(Json(json!({ "message": "Address deleted successfully" })))
}

/// Dispatch the order confirmation email without blocking the response.
fn send_confirmation_in_background(email: EmailService, user: User, order: &Order) {
    let order_number = order.order_number.clone();
    let total = Price::new(order.total_amount, order.currency.clone());

    tokio::spawn(async move {
        if let Err(err) = email
            .send_order_confirmation(&user.email, &user.first_name, &order_number, &total)
            .await
        {
            tracing::warn!(
                error = %err,
                order_number,
                "failed to send order confirmation email"
            );
        }
    });
}
