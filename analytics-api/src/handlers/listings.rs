use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::api::ApiError;
use crate::router::AppState;

// Timestamps in listing payloads are rendered for display, not for machine
// consumption.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn display_name(name: Option<String>, customer_id: i64) -> String {
    name.unwrap_or_else(|| format!("Customer {customer_id}"))
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: Option<String>,
    gender: Option<String>,
    age: Option<i32>,
    location: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CustomerEntry {
    pub id: i64,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub created_at: String,
}

#[instrument(skip_all)]
pub async fn customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerEntry>>, ApiError> {
    let rows: Vec<CustomerRow> = sqlx::query_as(
        "SELECT id, name, gender, age, location, created_at FROM customers ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| CustomerEntry {
                id: row.id,
                name: row.name,
                gender: row.gender,
                age: row.age,
                location: row.location,
                created_at: row.created_at.format(TIMESTAMP_FORMAT).to_string(),
            })
            .collect(),
    ))
}

#[derive(Serialize, sqlx::FromRow)]
pub struct ProductEntry {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub base_price: f64,
    pub stock_quantity: i32,
}

#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductEntry>>, ApiError> {
    let rows: Vec<ProductEntry> = sqlx::query_as(
        r#"
SELECT id, name, category, price::float8 AS price,
       base_price::float8 AS base_price, stock_quantity
FROM products
ORDER BY id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: i64,
    customer_id: i64,
    customer_name: Option<String>,
    purchase_date: DateTime<Utc>,
    total_amount: f64,
    discount_applied: bool,
}

#[derive(Serialize)]
pub struct PurchaseEntry {
    pub id: i64,
    pub customer: String,
    pub purchase_date: String,
    pub total_amount: f64,
    pub discount_applied: bool,
}

#[instrument(skip_all)]
pub async fn purchases(
    State(state): State<AppState>,
) -> Result<Json<Vec<PurchaseEntry>>, ApiError> {
    let rows: Vec<PurchaseRow> = sqlx::query_as(
        r#"
SELECT p.id, p.customer_id, c.name AS customer_name,
       p.purchase_date, p.total_amount::float8 AS total_amount, p.discount_applied
FROM purchases p
JOIN customers c ON c.id = p.customer_id
ORDER BY p.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| PurchaseEntry {
                id: row.id,
                customer: display_name(row.customer_name, row.customer_id),
                purchase_date: row.purchase_date.format(TIMESTAMP_FORMAT).to_string(),
                total_amount: row.total_amount,
                discount_applied: row.discount_applied,
            })
            .collect(),
    ))
}

#[derive(sqlx::FromRow)]
struct PurchaseItemRow {
    id: i64,
    purchase_id: i64,
    product_name: String,
    category: String,
    quantity: i32,
    price_at_purchase: f64,
    purchase_date: DateTime<Utc>,
    customer_id: i64,
    customer_name: Option<String>,
}

#[derive(Serialize)]
pub struct PurchaseItemEntry {
    pub id: i64,
    pub purchase_id: i64,
    pub product_name: String,
    pub category: String,
    pub quantity: i32,
    pub price_at_purchase: f64,
    pub purchase_date: String,
    pub customer: String,
}

#[instrument(skip_all)]
pub async fn purchase_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<PurchaseItemEntry>>, ApiError> {
    let rows: Vec<PurchaseItemRow> = sqlx::query_as(
        r#"
SELECT pi.id, pi.purchase_id, pr.name AS product_name, pr.category,
       pi.quantity, pi.price_at_purchase::float8 AS price_at_purchase,
       p.purchase_date, p.customer_id, c.name AS customer_name
FROM purchase_items pi
JOIN purchases p ON p.id = pi.purchase_id
JOIN products pr ON pr.id = pi.product_id
JOIN customers c ON c.id = p.customer_id
ORDER BY pi.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| PurchaseItemEntry {
                id: row.id,
                purchase_id: row.purchase_id,
                product_name: row.product_name,
                category: row.category,
                quantity: row.quantity,
                price_at_purchase: row.price_at_purchase,
                purchase_date: row.purchase_date.format(TIMESTAMP_FORMAT).to_string(),
                customer: display_name(row.customer_name, row.customer_id),
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_customers_render_by_id() {
        assert_eq!(display_name(None, 42), "Customer 42");
        assert_eq!(display_name(Some("Ada".to_owned()), 42), "Ada");
    }
}
