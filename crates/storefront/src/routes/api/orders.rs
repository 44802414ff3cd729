//! `/api/orders`

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use cartwright_core::OrderId;

use super::{ApiJson, Deleted, Doc, Docs};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::OrderPatch;
use crate::services::orders::OrderService;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, auth: OptionalAuth) -> Result<Response> {
    let orders = OrderService::new(state.store())
        .list(auth.principal())
        .await?;
    Ok(Docs::from(orders).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = OrderService::new(state.store())
        .get(auth.principal(), id)
        .await?;
    Ok(Doc { doc: order }.into_response())
}

/// Place an order. The order number is always server-assigned.
pub async fn create(
    State(state): State<AppState>,
    auth: OptionalAuth,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<Response> {
    let order = OrderService::new(state.store())
        .create(auth.principal(), patch)
        .await?;

    add_breadcrumb(
        "order",
        "Order placed",
        Some(&[
            ("order_number", order.order_number.as_str()),
            ("status", &order.data.status.to_string()),
        ]),
    );
    Ok(Doc::created(order))
}

pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<OrderId>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<Response> {
    let order = OrderService::new(state.store())
        .update(auth.principal(), id, patch)
        .await?;
    Ok(Doc { doc: order }.into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let id = OrderService::new(state.store())
        .delete(auth.principal(), id)
        .await?;
    Ok(Deleted { id }.into_response())
}
