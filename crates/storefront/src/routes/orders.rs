//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomline_core::{Capability, OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::{RequireAuth, authorize};
use crate::models::order::{Order, OrderDraft, OrderLine};
use crate::models::{PaymentInfo, ShippingInfo};
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

/// Order creation body. Totals beyond tax and shipping are computed
/// server-side from current product prices.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderLine>,
    pub payment_info: PaymentInfo,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
}

/// Status-advance body for the admin endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

/// Response carrying one order.
#[derive(Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

/// Response carrying a list of orders.
#[derive(Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

/// Place an order.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    if body.order_items.is_empty() {
        return Err(AppError::Validation(
            "an order needs at least one item".to_owned(),
        ));
    }
    if body.order_items.iter().any(|line| line.quantity < 1) {
        return Err(AppError::Validation(
            "item quantity must be at least 1".to_owned(),
        ));
    }
    if body.tax_amount < Decimal::ZERO || body.shipping_amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "amounts cannot be negative".to_owned(),
        ));
    }

    let draft = OrderDraft {
        shipping_info: body.shipping_info,
        payment_info: body.payment_info,
        items: body.order_items,
        tax_amount: body.tax_amount,
        shipping_amount: body.shipping_amount,
    };

    let order = OrderRepository::new(state.pool())
        .create(current.id, &draft)
        .await
        .map_err(or_not_found("one of the ordered products does not exist"))?;

    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

/// One order. Owners see their own; order managers see all.
pub async fn get_one(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .find(OrderId::new(id))
        .await
        .map_err(or_not_found("please check order id"))?;

    if order.user_id != current.id && !current.role.allows(Capability::ManageOrders) {
        // Hide other users' orders rather than confirming they exist.
        return Err(AppError::NotFound("please check order id".to_owned()));
    }

    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

/// The logged-in user's orders.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(current.id)
        .await?;

    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

/// Admin: every order in the store.
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<OrderListResponse>> {
    authorize(&current, Capability::ManageOrders)?;

    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

/// Admin: advance an order's status.
///
/// The first transition out of `placed` confirms the order and applies
/// every line item's stock decrement atomically; later transitions never
/// touch stock again.
pub async fn admin_update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    authorize(&current, Capability::ManageOrders)?;

    let order = OrderRepository::new(state.pool())
        .advance_status(OrderId::new(id), body.status)
        .await
        .map_err(or_not_found("please check order id"))?;

    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

/// Admin: delete an order.
pub async fn admin_delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    authorize(&current, Capability::ManageOrders)?;

    OrderRepository::new(state.pool())
        .delete(OrderId::new(id))
        .await
        .map_err(or_not_found("please check order id"))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "order deleted successfully".to_owned(),
    }))
}
