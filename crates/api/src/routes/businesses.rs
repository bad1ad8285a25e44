//! Business registration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::BusinessId;
use serde::{Deserialize, Serialize};
use store::BusinessDirectory;

use crate::error::ApiError;
use crate::state::{AppState, CommerceStore};

#[derive(Deserialize)]
pub struct RegisterBusinessRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct BusinessResponse {
    pub business_id: BusinessId,
    pub name: String,
}

/// POST /businesses — register a business.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterBusinessRequest>,
) -> Result<(StatusCode, Json<BusinessResponse>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let business_id = state.store.register_business(name).await?;
    tracing::info!(%business_id, "business registered");

    Ok((
        StatusCode::CREATED,
        Json(BusinessResponse {
            business_id,
            name: name.to_string(),
        }),
    ))
}
