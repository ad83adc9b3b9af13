//! Ledger engine: the only writer of `hub_inventory` and `stock_movements`.
//!
//! Every mutation is one transaction pairing the stock-level change with its
//! audit movement row. The record row is the unit of mutual exclusion: adjust
//! takes a `FOR UPDATE` lock on it, so concurrent adjusts on one
//! (product, hub) pair serialize and each non-negativity check sees all prior
//! committed effects. Different pairs never contend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, query_scalar, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Cause of a stock-level change, recorded on every movement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementType {
    GoodsReceipt,
    CustomerOrderFulfillment,
    StockAdjustment,
    CustomerReturn,
    InterHubTransferIn,
    InterHubTransferOut,
    /// Reserved for the movement written by `initialize`; not accepted on
    /// the adjust path.
    InitialSetup,
}

impl StockMovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoodsReceipt => "GOODS_RECEIPT",
            Self::CustomerOrderFulfillment => "CUSTOMER_ORDER_FULFILLMENT",
            Self::StockAdjustment => "STOCK_ADJUSTMENT",
            Self::CustomerReturn => "CUSTOMER_RETURN",
            Self::InterHubTransferIn => "INTER_HUB_TRANSFER_IN",
            Self::InterHubTransferOut => "INTER_HUB_TRANSFER_OUT",
            Self::InitialSetup => "INITIAL_SETUP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GOODS_RECEIPT" => Some(Self::GoodsReceipt),
            "CUSTOMER_ORDER_FULFILLMENT" => Some(Self::CustomerOrderFulfillment),
            "STOCK_ADJUSTMENT" => Some(Self::StockAdjustment),
            "CUSTOMER_RETURN" => Some(Self::CustomerReturn),
            "INTER_HUB_TRANSFER_IN" => Some(Self::InterHubTransferIn),
            "INTER_HUB_TRANSFER_OUT" => Some(Self::InterHubTransferOut),
            "INITIAL_SETUP" => Some(Self::InitialSetup),
            _ => None,
        }
    }
}

/// Authoritative stock count for one product at one hub.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub current_stock_level: i32,
    pub reserved_stock_level: i32,
    pub reorder_point: i32,
    pub last_restock_request_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Units sellable right now: physically present minus reserved.
    pub fn available_for_sale(&self) -> i32 {
        self.current_stock_level - self.reserved_stock_level
    }

    pub fn needs_reorder(&self) -> bool {
        self.available_for_sale() <= self.reorder_point
    }
}

#[derive(Debug, Clone)]
pub struct InitializeStock {
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub initial_stock_level: i32,
    pub reserved_stock_level: i32,
    pub reorder_point: i32,
    pub last_restock_request_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AdjustStock {
    pub product_id: Uuid,
    pub hub_id: Uuid,
    pub quantity_change: i32,
    pub movement_type: StockMovementType,
    pub reason: Option<String>,
    pub related_hub_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0} must not be below 0")]
    NegativeLevel(&'static str),
    #[error("quantity change must be a non-zero number")]
    ZeroQuantityChange,
    #[error("quantity change overflows the stock level")]
    QuantityOverflow,
    #[error("insufficient stock: cannot change stock by {requested}, current stock is {current}")]
    InsufficientStock { current: i32, requested: i32 },
    #[error("product {0} not found")]
    ProductNotFound(Uuid),
    #[error("hub {0} not found")]
    HubNotFound(Uuid),
    #[error("no inventory record for product {product_id} at hub {hub_id}; initialize it first")]
    RecordNotFound { product_id: Uuid, hub_id: Uuid },
    #[error("inventory already initialized for product {product_id} at hub {hub_id}; use adjust instead")]
    AlreadyInitialized { product_id: Uuid, hub_id: Uuid },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

const RECORD_COLUMNS: &str = "id, product_id, hub_id, current_stock_level, reserved_stock_level, \
     reorder_point, last_restock_request_date, created_at, updated_at";

pub(crate) fn default_reason(quantity_change: i32) -> String {
    format!("Stock adjusted by {quantity_change}")
}

/// Create the stock record for a (product, hub) pair and write the paired
/// `INITIAL_SETUP` movement. Fails with `AlreadyInitialized` when the pair
/// already has a record; record and movement commit or roll back together.
pub async fn initialize(
    pool: &PgPool,
    req: InitializeStock,
    actor_id: Uuid,
) -> Result<StockRecord, LedgerError> {
    if req.initial_stock_level < 0 {
        return Err(LedgerError::NegativeLevel("initial stock level"));
    }
    if req.reserved_stock_level < 0 {
        return Err(LedgerError::NegativeLevel("reserved stock level"));
    }
    if req.reorder_point < 0 {
        return Err(LedgerError::NegativeLevel("reorder point"));
    }

    let mut tx = pool.begin().await?;

    let product = query_scalar::<_, i32>("SELECT 1 FROM products WHERE id = $1")
        .bind(req.product_id)
        .fetch_optional(&mut *tx)
        .await?;
    if product.is_none() {
        return Err(LedgerError::ProductNotFound(req.product_id));
    }

    let hub = query_scalar::<_, i32>("SELECT 1 FROM delivery_hubs WHERE id = $1")
        .bind(req.hub_id)
        .fetch_optional(&mut *tx)
        .await?;
    if hub.is_none() {
        return Err(LedgerError::HubNotFound(req.hub_id));
    }

    let inserted = query_as::<_, StockRecord>(&format!(
        "INSERT INTO hub_inventory \
             (product_id, hub_id, current_stock_level, reserved_stock_level, reorder_point, last_restock_request_date) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (product_id, hub_id) DO NOTHING \
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(req.product_id)
    .bind(req.hub_id)
    .bind(req.initial_stock_level)
    .bind(req.reserved_stock_level)
    .bind(req.reorder_point)
    .bind(req.last_restock_request_date)
    .fetch_optional(&mut *tx)
    .await?;

    let record = inserted.ok_or(LedgerError::AlreadyInitialized {
        product_id: req.product_id,
        hub_id: req.hub_id,
    })?;

    append_movement(
        &mut tx,
        &record,
        StockMovementType::InitialSetup,
        req.initial_stock_level,
        actor_id,
        Some("Initial inventory setup for new product/hub combination".to_string()),
        None,
    )
    .await?;

    tx.commit().await?;

    info!(
        product_id = %record.product_id,
        hub_id = %record.hub_id,
        initial_stock_level = record.current_stock_level,
        "initialized hub inventory record"
    );
    Ok(record)
}

/// Apply a signed quantity change to an existing stock record and write the
/// paired movement row. The record row is locked for the duration of the
/// transaction, so the non-negativity check cannot act on a stale level.
pub async fn adjust(
    pool: &PgPool,
    req: AdjustStock,
    actor_id: Uuid,
) -> Result<StockRecord, LedgerError> {
    if req.quantity_change == 0 {
        return Err(LedgerError::ZeroQuantityChange);
    }

    let mut tx = pool.begin().await?;

    let current = query_as::<_, StockRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM hub_inventory \
         WHERE product_id = $1 AND hub_id = $2 FOR UPDATE"
    ))
    .bind(req.product_id)
    .bind(req.hub_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(LedgerError::RecordNotFound {
        product_id: req.product_id,
        hub_id: req.hub_id,
    })?;

    let new_level = current
        .current_stock_level
        .checked_add(req.quantity_change)
        .ok_or(LedgerError::QuantityOverflow)?;
    if new_level < 0 {
        // Dropping the transaction rolls back; the record stays untouched and
        // no movement row is written.
        return Err(LedgerError::InsufficientStock {
            current: current.current_stock_level,
            requested: req.quantity_change,
        });
    }

    let updated = query_as::<_, StockRecord>(&format!(
        "UPDATE hub_inventory SET current_stock_level = $1, updated_at = NOW() \
         WHERE id = $2 RETURNING {RECORD_COLUMNS}"
    ))
    .bind(new_level)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    let reason = req
        .reason
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_reason(req.quantity_change));
    append_movement(
        &mut tx,
        &updated,
        req.movement_type,
        req.quantity_change,
        actor_id,
        Some(reason),
        req.related_hub_id,
    )
    .await?;

    tx.commit().await?;

    info!(
        product_id = %updated.product_id,
        hub_id = %updated.hub_id,
        quantity_change = req.quantity_change,
        new_stock_level = updated.current_stock_level,
        movement_type = req.movement_type.as_str(),
        "adjusted hub inventory stock"
    );
    Ok(updated)
}

#[allow(clippy::too_many_arguments)]
async fn append_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &StockRecord,
    movement_type: StockMovementType,
    quantity_change: i32,
    actor_id: Uuid,
    reason: Option<String>,
    related_hub_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    query(
        "INSERT INTO stock_movements \
             (product_id, hub_id, movement_type, quantity_change, new_stock_level, actor_id, reason, related_hub_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.product_id)
    .bind(record.hub_id)
    .bind(movement_type.as_str())
    .bind(quantity_change)
    .bind(record.current_stock_level)
    .bind(actor_id)
    .bind(reason)
    .bind(related_hub_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(current: i32, reserved: i32, reorder: i32) -> StockRecord {
        StockRecord {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            hub_id: Uuid::new_v4(),
            current_stock_level: current,
            reserved_stock_level: reserved,
            reorder_point: reorder,
            last_restock_request_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn movement_type_round_trips_wire_strings() {
        for movement in [
            StockMovementType::GoodsReceipt,
            StockMovementType::CustomerOrderFulfillment,
            StockMovementType::StockAdjustment,
            StockMovementType::CustomerReturn,
            StockMovementType::InterHubTransferIn,
            StockMovementType::InterHubTransferOut,
            StockMovementType::InitialSetup,
        ] {
            assert_eq!(StockMovementType::parse(movement.as_str()), Some(movement));
        }
    }

    #[test]
    fn movement_type_rejects_unknown_strings() {
        assert_eq!(StockMovementType::parse("RESTOCK"), None);
        assert_eq!(StockMovementType::parse("goods_receipt"), None);
        assert_eq!(StockMovementType::parse(""), None);
    }

    #[test]
    fn default_reason_mentions_delta() {
        assert_eq!(default_reason(-45), "Stock adjusted by -45");
        assert_eq!(default_reason(7), "Stock adjusted by 7");
    }

    #[test]
    fn available_for_sale_subtracts_reserved() {
        assert_eq!(record(50, 20, 0).available_for_sale(), 30);
        assert_eq!(record(5, 5, 0).available_for_sale(), 0);
    }

    #[test]
    fn needs_reorder_uses_reservation_aware_availability() {
        // 50 on hand but 45 reserved leaves 5 sellable, at or under the
        // reorder point of 10.
        assert!(record(50, 45, 10).needs_reorder());
        assert!(record(10, 0, 10).needs_reorder());
        assert!(!record(11, 0, 10).needs_reorder());
    }
}
