//! Read surface: filtered, joined, paginated stock views.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use common_auth::{ensure_role, AuthContext, INVENTORY_ROLES};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use sqlx::{query_as, query_scalar, PgPool};
use uuid::Uuid;

use crate::{AppState, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStockParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub hub_id: Option<Uuid>,
    pub hub_name: Option<String>,
    pub search: Option<String>,
    pub low_stock_only: Option<bool>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockViewItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub product_unit: Option<String>,
    pub hub_id: Uuid,
    pub hub_name: String,
    pub current_stock_level: i32,
    pub reserved_stock_level: i32,
    pub reorder_point: i32,
    pub available_for_sale: i32,
    pub needs_reorder: bool,
    pub last_restock_request_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPage {
    pub items: Vec<StockViewItem>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl StockPage {
    fn empty(page: i64, limit: i64) -> Self {
        Self { items: Vec::new(), total: 0, page, limit }
    }
}

pub(crate) fn normalize_page(page: Option<i64>) -> i64 {
    page.filter(|value| *value >= 1).unwrap_or(1)
}

pub(crate) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit
        .filter(|value| *value >= 1)
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .min(MAX_PAGE_LIMIT)
}

// Saturating so an absurd page number yields an offset past the data
// (an empty page) instead of overflowing i64.
pub(crate) fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(limit)
}

const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR hi.hub_id = $1) \
     AND ($2::text IS NULL OR p.name ILIKE $2) \
     AND (NOT $3::bool OR hi.current_stock_level - hi.reserved_stock_level <= hi.reorder_point)";

/// Build one page of the joined stock view. An unknown `hub_name` yields an
/// empty page, not an error. Rows are ordered by record creation time then id
/// (stable default; the upstream contract leaves ordering open).
pub async fn list_stock(pool: &PgPool, params: ListStockParams) -> Result<StockPage, sqlx::Error> {
    let page = normalize_page(params.page);
    let limit = normalize_limit(params.limit);

    let hub_filter = match (params.hub_id, params.hub_name.as_deref()) {
        (Some(hub_id), _) => Some(hub_id),
        (None, Some(name)) if !name.trim().is_empty() => {
            let resolved =
                query_scalar::<_, Uuid>("SELECT id FROM delivery_hubs WHERE LOWER(name) = LOWER($1)")
                    .bind(name.trim())
                    .fetch_optional(pool)
                    .await?;
            match resolved {
                Some(hub_id) => Some(hub_id),
                None => return Ok(StockPage::empty(page, limit)),
            }
        }
        _ => None,
    };

    let search_pattern = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{term}%"));
    let low_stock_only = params.low_stock_only.unwrap_or(false);

    let total = query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM hub_inventory hi \
         JOIN products p ON p.id = hi.product_id \
         JOIN delivery_hubs h ON h.id = hi.hub_id \
         WHERE {FILTER_CLAUSE}"
    ))
    .bind(hub_filter)
    .bind(search_pattern.as_deref())
    .bind(low_stock_only)
    .fetch_one(pool)
    .await?;

    let items = query_as::<_, StockViewItem>(&format!(
        "SELECT hi.product_id, p.name AS product_name, p.sku AS product_sku, \
                p.unit AS product_unit, hi.hub_id, h.name AS hub_name, \
                hi.current_stock_level, hi.reserved_stock_level, hi.reorder_point, \
                hi.current_stock_level - hi.reserved_stock_level AS available_for_sale, \
                hi.current_stock_level - hi.reserved_stock_level <= hi.reorder_point AS needs_reorder, \
                hi.last_restock_request_date, hi.created_at, hi.updated_at \
         FROM hub_inventory hi \
         JOIN products p ON p.id = hi.product_id \
         JOIN delivery_hubs h ON h.id = hi.hub_id \
         WHERE {FILTER_CLAUSE} \
         ORDER BY hi.created_at, hi.id \
         LIMIT $4 OFFSET $5"
    ))
    .bind(hub_filter)
    .bind(search_pattern.as_deref())
    .bind(low_stock_only)
    .bind(limit)
    .bind(page_offset(page, limit))
    .fetch_all(pool)
    .await?;

    Ok(StockPage { items, total, page, limit })
}

pub async fn list_hub_stock(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<ListStockParams>,
) -> Result<Json<StockPage>, ApiError> {
    ensure_role(&auth, INVENTORY_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "staff", trace_id: None })?;

    let view = list_stock(&state.db, params)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(-3)), 1);
        assert_eq!(normalize_page(Some(7)), 7);
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None), DEFAULT_PAGE_LIMIT);
        assert_eq!(normalize_limit(Some(0)), DEFAULT_PAGE_LIMIT);
        assert_eq!(normalize_limit(Some(25)), 25);
        assert_eq!(normalize_limit(Some(1000)), MAX_PAGE_LIMIT);
    }

    #[test]
    fn offset_saturates_for_huge_page_numbers() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(i64::MAX, 10), i64::MAX);
        assert_eq!(page_offset(i64::MAX, MAX_PAGE_LIMIT), i64::MAX);
    }
}
