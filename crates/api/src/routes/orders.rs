//! Order placement and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{BusinessId, ItemId, OrderId};
use domain::{LineRequest, Order, OrderLine, OrderStatus, PlaceOrder};
use ordering::OrderingError;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::{AppState, CommerceStore};

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub customer_contact: String,
    pub delivery_address: Option<String>,
    pub items: Vec<LineItemRequest>,
}

#[derive(Deserialize)]
pub struct LineItemRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: OrderId,
    pub total_amount_cents: i64,
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub business_id: BusinessId,
    pub customer_name: String,
    pub customer_contact: String,
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<OrderLineResponse>>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub inventory_item_id: Option<ItemId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl OrderResponse {
    fn summary(order: Order) -> Self {
        Self {
            id: order.id,
            business_id: order.business_id,
            customer_name: order.customer_name,
            customer_contact: order.customer_contact,
            delivery_address: order.delivery_address,
            status: order.status,
            total_amount_cents: order.total_amount.cents(),
            created_at: order.created_at,
            lines: None,
        }
    }

    fn detailed(order: Order, lines: Vec<OrderLine>) -> Self {
        let lines = lines
            .into_iter()
            .map(|line| OrderLineResponse {
                inventory_item_id: line.inventory_item_id,
                name: line.name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                total_price_cents: line.total_price.cents(),
            })
            .collect();
        Self {
            lines: Some(lines),
            ..Self::summary(order)
        }
    }
}

// -- Handlers --

/// POST /businesses/:business_id/orders — reserve stock and place an order.
///
/// The caller waits up to the configured deadline and gets 503 after that.
/// The placement itself carries on and either commits or returns its stock.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(business_id): Path<BusinessId>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let lines = req
        .items
        .iter()
        .map(|item| LineRequest::new(item.item_id, item.quantity))
        .collect();
    let mut request = PlaceOrder::new(business_id, req.customer_name, req.customer_contact, lines);
    request.delivery_address = req.delivery_address;

    let deadline = state.place_order_timeout;
    let (order, _) = tokio::time::timeout(deadline, state.coordinator.place_order(request))
        .await
        .map_err(|_| {
            metrics::counter!("order_placement_timeouts_total").increment(1);
            OrderingError::Timeout {
                millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }
        })??;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: order.id,
            total_amount_cents: order.total_amount.cents(),
            status: order.status,
        }),
    ))
}

/// GET /businesses/:business_id/orders — list orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.coordinator.list_orders(business_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::summary).collect()))
}

/// GET /businesses/:business_id/orders/:order_id — one order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, order_id)): Path<(BusinessId, OrderId)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let (order, lines) = state.coordinator.get_order(business_id, order_id).await?;
    Ok(Json(OrderResponse::detailed(order, lines)))
}

/// POST /businesses/:business_id/orders/:order_id/ship
#[tracing::instrument(skip(state))]
pub async fn ship<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, order_id)): Path<(BusinessId, OrderId)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.status.mark_shipped(business_id, order_id).await?;
    Ok(Json(OrderResponse::summary(order)))
}

/// POST /businesses/:business_id/orders/:order_id/complete
#[tracing::instrument(skip(state))]
pub async fn complete<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, order_id)): Path<(BusinessId, OrderId)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.status.complete_order(business_id, order_id).await?;
    Ok(Json(OrderResponse::summary(order)))
}

/// POST /businesses/:business_id/orders/:order_id/cancel — cancel a pending
/// order and return its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, order_id)): Path<(BusinessId, OrderId)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.status.cancel_order(business_id, order_id).await?;
    Ok(Json(OrderResponse::summary(order)))
}
