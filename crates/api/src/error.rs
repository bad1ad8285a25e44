//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ValidationError;
use ordering::OrderingError;
use serde_json::{Map, Value, json};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Placement, status or store error.
    Ordering(OrderingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "kind": "bad_request" }),
            ),
            ApiError::Ordering(err) => ordering_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn ordering_error_to_response(err: OrderingError) -> (StatusCode, Value) {
    let status = match &err {
        OrderingError::BusinessNotFound { .. }
        | OrderingError::ItemNotFound { .. }
        | OrderingError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
        OrderingError::InsufficientStock { .. } | OrderingError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        OrderingError::EmptyOrder
        | OrderingError::InvalidQuantity { .. }
        | OrderingError::Invalid(_)
        | OrderingError::AmountOverflow { .. } => StatusCode::BAD_REQUEST,
        OrderingError::PersistenceFailed(e) => {
            tracing::error!(error = %e, "store failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
        OrderingError::StockNotReleased { item_ids, .. } => {
            tracing::error!(?item_ids, "placement left stock reserved");
            StatusCode::SERVICE_UNAVAILABLE
        }
        OrderingError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    let mut body = Map::new();
    body.insert("error".into(), Value::from(err.to_string()));
    body.insert("kind".into(), Value::from(err.kind()));

    match &err {
        OrderingError::InvalidQuantity { item_id, quantity } => {
            body.insert("item_id".into(), json!(item_id));
            body.insert("quantity".into(), json!(quantity));
        }
        OrderingError::AmountOverflow { item_id } | OrderingError::ItemNotFound { item_id } => {
            body.insert("item_id".into(), json!(item_id));
        }
        OrderingError::BusinessNotFound { business_id } => {
            body.insert("business_id".into(), json!(business_id));
        }
        OrderingError::OrderNotFound { order_id } => {
            body.insert("order_id".into(), json!(order_id));
        }
        OrderingError::InsufficientStock {
            item_id,
            requested,
            available,
        } => {
            body.insert("item_id".into(), json!(item_id));
            body.insert("requested".into(), json!(requested));
            body.insert("available".into(), json!(available));
        }
        OrderingError::InvalidTransition {
            order_id,
            from,
            action,
        } => {
            body.insert("order_id".into(), json!(order_id));
            body.insert("from".into(), json!(from));
            body.insert("action".into(), json!(action));
        }
        OrderingError::Invalid(ValidationError::QuantityOverflow { item_id }) => {
            body.insert("item_id".into(), json!(item_id));
        }
        OrderingError::StockNotReleased { item_ids, .. } => {
            body.insert("item_ids".into(), json!(item_ids));
        }
        OrderingError::Timeout { millis } => {
            body.insert("timeout_ms".into(), json!(millis));
        }
        OrderingError::EmptyOrder | OrderingError::Invalid(_) | OrderingError::PersistenceFailed(_) => {}
    }

    (status, Value::Object(body))
}

impl From<OrderingError> for ApiError {
    fn from(err: OrderingError) -> Self {
        ApiError::Ordering(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Ordering(err.into())
    }
}
