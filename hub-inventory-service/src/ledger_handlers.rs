//! Write surface of the hub inventory ledger: initialize and adjust.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common_auth::{ensure_role, AuthContext, INVENTORY_ROLES};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{
    self, AdjustStock, InitializeStock, LedgerError, StockMovementType, StockRecord,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeHubInventoryRequest {
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub initial_stock_level: i32,
    #[serde(default)]
    pub reserved_stock_level: i32,
    #[serde(default)]
    pub reorder_point: i32,
    #[serde(default)]
    pub last_restock_request_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustHubStockRequest {
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub quantity_change: i32,
    /// Wire string of the movement enum, e.g. "CUSTOMER_ORDER_FULFILLMENT".
    pub stock_movement_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub related_hub_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecordResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub current_stock_level: i32,
    pub reserved_stock_level: i32,
    pub reorder_point: i32,
    pub available_for_sale: i32,
    pub needs_reorder: bool,
    pub last_restock_request_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StockRecord> for StockRecordResponse {
    fn from(record: StockRecord) -> Self {
        Self {
            available_for_sale: record.available_for_sale(),
            needs_reorder: record.needs_reorder(),
            id: record.id,
            product_id: record.product_id,
            hub_id: record.hub_id,
            current_stock_level: record.current_stock_level,
            reserved_stock_level: record.reserved_stock_level,
            reorder_point: record.reorder_point,
            last_restock_request_date: record.last_restock_request_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

pub async fn initialize_hub_inventory(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<InitializeHubInventoryRequest>,
) -> Result<(StatusCode, Json<StockRecordResponse>), ApiError> {
    ensure_role(&auth, INVENTORY_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "staff", trace_id: None })?;

    let record = ledger::initialize(
        &state.db,
        InitializeStock {
            product_id: payload.product_id,
            hub_id: payload.hub_id,
            initial_stock_level: payload.initial_stock_level,
            reserved_stock_level: payload.reserved_stock_level,
            reorder_point: payload.reorder_point,
            last_restock_request_date: payload.last_restock_request_date,
        },
        auth.actor_id(),
    )
    .await
    .map_err(ledger_error_to_api)?;

    state.metrics.initializations_total.inc();
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn adjust_hub_stock(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<AdjustHubStockRequest>,
) -> Result<Json<StockRecordResponse>, ApiError> {
    ensure_role(&auth, INVENTORY_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "staff", trace_id: None })?;

    let movement_type = match StockMovementType::parse(&payload.stock_movement_type) {
        // INITIAL_SETUP is written by initialize only.
        Some(StockMovementType::InitialSetup) | None => {
            return Err(ApiError::BadRequest {
                code: "invalid_movement_type",
                trace_id: None,
                message: Some(format!(
                    "unknown stock movement type '{}'",
                    payload.stock_movement_type
                )),
            });
        }
        Some(movement_type) => movement_type,
    };

    let timer = state.metrics.adjust_duration_seconds.start_timer();
    let result = ledger::adjust(
        &state.db,
        AdjustStock {
            product_id: payload.product_id,
            hub_id: payload.hub_id,
            quantity_change: payload.quantity_change,
            movement_type,
            reason: payload.reason,
            related_hub_id: payload.related_hub_id,
        },
        auth.actor_id(),
    )
    .await;
    timer.observe_duration();

    match result {
        Ok(record) => {
            state
                .metrics
                .stock_adjustments_total
                .with_label_values(&[movement_type.as_str()])
                .inc();
            Ok(Json(record.into()))
        }
        Err(err) => {
            if matches!(err, LedgerError::InsufficientStock { .. }) {
                state.metrics.insufficient_stock_rejections.inc();
            }
            Err(ledger_error_to_api(err))
        }
    }
}

fn ledger_error_to_api(err: LedgerError) -> ApiError {
    match err {
        LedgerError::NegativeLevel(_) => ApiError::BadRequest {
            code: "negative_stock_level",
            trace_id: None,
            message: Some(err.to_string()),
        },
        LedgerError::ZeroQuantityChange | LedgerError::QuantityOverflow => ApiError::BadRequest {
            code: "invalid_quantity",
            trace_id: None,
            message: Some(err.to_string()),
        },
        LedgerError::InsufficientStock { .. } => ApiError::BadRequest {
            code: "insufficient_stock",
            trace_id: None,
            message: Some(err.to_string()),
        },
        LedgerError::ProductNotFound(_) => ApiError::not_found("product_not_found", err.to_string()),
        LedgerError::HubNotFound(_) => ApiError::not_found("hub_not_found", err.to_string()),
        LedgerError::RecordNotFound { .. } => {
            ApiError::not_found("inventory_record_not_found", err.to_string())
        }
        LedgerError::AlreadyInitialized { .. } => {
            ApiError::conflict("inventory_already_initialized", err.to_string())
        }
        LedgerError::Db(db_err) => ApiError::internal(db_err, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn insufficient_stock_maps_to_bad_request() {
        let err = ledger_error_to_api(LedgerError::InsufficientStock {
            current: 5,
            requested: -45,
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get("X-Error-Code").unwrap(),
            "insufficient_stock"
        );
    }

    #[test]
    fn overflowing_delta_maps_to_invalid_quantity() {
        let resp = ledger_error_to_api(LedgerError::QuantityOverflow).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_quantity");
    }

    #[test]
    fn duplicate_initialize_maps_to_conflict() {
        let err = ledger_error_to_api(LedgerError::AlreadyInitialized {
            product_id: Uuid::new_v4(),
            hub_id: Uuid::new_v4(),
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_record_maps_to_not_found() {
        let err = ledger_error_to_api(LedgerError::RecordNotFound {
            product_id: Uuid::new_v4(),
            hub_id: Uuid::new_v4(),
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("X-Error-Code").unwrap(),
            "inventory_record_not_found"
        );
    }

    #[test]
    fn response_projection_computes_derived_fields() {
        let record = StockRecord {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            hub_id: Uuid::new_v4(),
            current_stock_level: 50,
            reserved_stock_level: 45,
            reorder_point: 10,
            last_restock_request_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let body = StockRecordResponse::from(record);
        assert_eq!(body.available_for_sale, 5);
        assert!(body.needs_reorder);
    }
}
