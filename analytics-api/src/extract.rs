use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;

use segmentation::CustomerFeatureRecord;

#[derive(sqlx::FromRow)]
struct CustomerAggregateRow {
    customer_id: i64,
    total_spend: f64,
    purchase_frequency: i64,
    last_purchase: DateTime<Utc>,
}

/// Relational feature extraction: one record per customer with at least one
/// purchase. Aggregating over `purchases` means zero-purchase customers
/// never appear, they are skipped rather than zero-filled.
///
/// Recency is whole days between `reference_date` and the most recent
/// purchase; callers pass today's date, tests pass a fixed one.
pub async fn customer_features(
    pool: &PgPool,
    reference_date: NaiveDate,
) -> Result<Vec<CustomerFeatureRecord>, sqlx::Error> {
    let rows: Vec<CustomerAggregateRow> = sqlx::query_as(
        r#"
SELECT
    customer_id,
    SUM(total_amount)::float8 AS total_spend,
    COUNT(*) AS purchase_frequency,
    MAX(purchase_date) AS last_purchase
FROM purchases
GROUP BY customer_id
ORDER BY customer_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerFeatureRecord {
            customer_id: Value::from(row.customer_id),
            total_spend: row.total_spend,
            purchase_frequency: row.purchase_frequency.max(0) as u64,
            last_purchase_days: (reference_date - row.last_purchase.date_naive()).num_days(),
        })
        .collect())
}
