//! Owner inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BusinessId, ItemId};
use domain::{InventoryRecord, InventoryUpdate, Money, NewInventoryItem};
use ordering::OrderingError;
use serde::{Deserialize, Serialize};
use store::{BusinessDirectory, InventoryRepository};

use crate::error::ApiError;
use crate::state::{AppState, CommerceStore};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub quantity_on_hand: i64,
    pub unit: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub quantity_on_hand: Option<i64>,
    pub category: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub business_id: BusinessId,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub quantity_on_hand: i64,
    pub unit: Option<String>,
}

impl From<InventoryRecord> for ItemResponse {
    fn from(record: InventoryRecord) -> Self {
        Self {
            id: record.id,
            business_id: record.business_id,
            name: record.name,
            sku: record.sku,
            category: record.category,
            unit_price_cents: record.unit_price.cents(),
            quantity_on_hand: record.quantity_on_hand,
            unit: record.unit,
        }
    }
}

// -- Handlers --

/// GET /businesses/:business_id/inventory — list a business's items.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    require_business(&state, business_id).await?;

    let items = state.store.list_items(business_id).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /businesses/:business_id/inventory — add an item.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(business_id): Path<BusinessId>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    require_business(&state, business_id).await?;

    let mut item = NewInventoryItem::new(
        req.name,
        Money::from_cents(req.unit_price_cents),
        req.quantity_on_hand,
    );
    item.sku = req.sku;
    item.category = req.category;
    item.unit = req.unit;

    let record = state.store.insert_item(business_id, item).await?;
    tracing::info!(item_id = %record.id, "inventory item added");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// PATCH /businesses/:business_id/inventory/:item_id — edit name, price,
/// stock or category.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, item_id)): Path<(BusinessId, ItemId)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let update = InventoryUpdate {
        name: req.name,
        unit_price: req.unit_price_cents.map(Money::from_cents),
        quantity_on_hand: req.quantity_on_hand,
        category: req.category,
    };

    let record = state
        .store
        .update_item(business_id, item_id, update)
        .await?
        .ok_or(OrderingError::ItemNotFound { item_id })?;

    Ok(Json(record.into()))
}

/// DELETE /businesses/:business_id/inventory/:item_id — remove an item.
/// Past orders keep their line snapshots.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((business_id, item_id)): Path<(BusinessId, ItemId)>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_item(business_id, item_id).await? {
        return Err(OrderingError::ItemNotFound { item_id }.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn require_business<S: CommerceStore>(
    state: &AppState<S>,
    business_id: BusinessId,
) -> Result<(), ApiError> {
    if state.store.business_exists(business_id).await? {
        Ok(())
    } else {
        Err(OrderingError::BusinessNotFound { business_id }.into())
    }
}
