use std::collections::{BTreeMap, HashMap};

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::api::ApiError;
use crate::router::AppState;

/// Age buckets of the reporting endpoints. Customers younger than 18 match
/// no bucket and are dropped, as the reference reports do; only a NULL age
/// lands in `Unknown`.
fn age_bucket(age: Option<i32>) -> Option<&'static str> {
    match age {
        None => Some("Unknown"),
        Some(a) if (18..=25).contains(&a) => Some("18–25"),
        Some(a) if (26..=35).contains(&a) => Some("26–35"),
        Some(a) if (36..=50).contains(&a) => Some("36–50"),
        Some(a) if a >= 51 => Some("51+"),
        Some(_) => None,
    }
}

const AGE_BUCKETS: [&str; 5] = ["18–25", "26–35", "36–50", "51+", "Unknown"];

/// Gender cohorts are a fixed set; values outside it are dropped rather
/// than lumped together, matching the reference report.
fn gender_cohort(gender: Option<&str>) -> Option<&'static str> {
    match gender {
        None => Some("Unspecified"),
        Some("Male") => Some("Male"),
        Some("Female") => Some("Female"),
        Some("Non-binary") => Some("Non-binary"),
        Some("Other") => Some("Other"),
        Some(_) => None,
    }
}

#[derive(Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub category: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
}

#[derive(Serialize)]
pub struct TopProductsResponse {
    pub message: &'static str,
    pub top_products: Vec<TopProduct>,
}

#[instrument(skip_all)]
pub async fn top_products(
    State(state): State<AppState>,
) -> Result<Json<TopProductsResponse>, ApiError> {
    let top_products: Vec<TopProduct> = sqlx::query_as(
        r#"
SELECT
    p.id AS product_id,
    p.name,
    p.category,
    SUM(pi.quantity)::int8 AS total_quantity,
    SUM(pi.price_at_purchase)::float8 AS total_revenue
FROM purchase_items pi
JOIN products p ON p.id = pi.product_id
GROUP BY p.id, p.name, p.category
ORDER BY total_quantity DESC
LIMIT 10
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(TopProductsResponse {
        message: "Top products retrieved successfully.",
        top_products,
    }))
}

#[derive(Serialize, Default, Clone)]
pub struct DiscountUsage {
    pub total_customers: u64,
    pub purchases_with_discount: u64,
    pub revenue_with_discount: f64,
    pub purchases_without_discount: u64,
    pub revenue_without_discount: f64,
}

#[derive(Serialize)]
pub struct DiscountUsageResponse {
    pub message: &'static str,
    pub discount_usage_by_age_group: BTreeMap<&'static str, DiscountUsage>,
}

#[derive(sqlx::FromRow)]
struct PurchaseByAgeRow {
    age: Option<i32>,
    discount_applied: bool,
    total_amount: f64,
}

#[instrument(skip_all)]
pub async fn discount_usage(
    State(state): State<AppState>,
) -> Result<Json<DiscountUsageResponse>, ApiError> {
    let mut by_bucket: BTreeMap<&'static str, DiscountUsage> = AGE_BUCKETS
        .iter()
        .map(|bucket| (*bucket, DiscountUsage::default()))
        .collect();

    let ages: Vec<Option<i32>> = sqlx::query_scalar("SELECT age FROM customers")
        .fetch_all(&state.pool)
        .await?;
    for age in ages {
        if let Some(bucket) = age_bucket(age) {
            by_bucket.get_mut(bucket).unwrap().total_customers += 1;
        }
    }

    let purchases: Vec<PurchaseByAgeRow> = sqlx::query_as(
        r#"
SELECT c.age, p.discount_applied, p.total_amount::float8 AS total_amount
FROM purchases p
JOIN customers c ON c.id = p.customer_id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    for row in purchases {
        let Some(bucket) = age_bucket(row.age) else {
            continue;
        };
        let usage = by_bucket.get_mut(bucket).unwrap();
        if row.discount_applied {
            usage.purchases_with_discount += 1;
            usage.revenue_with_discount += row.total_amount;
        } else {
            usage.purchases_without_discount += 1;
            usage.revenue_without_discount += row.total_amount;
        }
    }

    Ok(Json(DiscountUsageResponse {
        message: "Discount usage analysis completed.",
        discount_usage_by_age_group: by_bucket,
    }))
}

#[derive(Serialize, Clone)]
pub struct CategoryStat {
    pub category: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
}

#[derive(Serialize)]
pub struct CategoryPreferencesResponse {
    pub message: &'static str,
    pub preferences: BTreeMap<&'static str, BTreeMap<&'static str, Vec<CategoryStat>>>,
}

#[derive(sqlx::FromRow)]
struct CohortRow {
    age: Option<i32>,
    gender: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CategoryByCohortRow {
    age: Option<i32>,
    gender: Option<String>,
    category: String,
    total_quantity: i64,
    total_revenue: f64,
}

#[instrument(skip_all)]
pub async fn category_preferences(
    State(state): State<AppState>,
) -> Result<Json<CategoryPreferencesResponse>, ApiError> {
    // Cohorts that exist get an entry even when they bought nothing;
    // everyone else is dropped entirely.
    let cohorts: Vec<CohortRow> = sqlx::query_as("SELECT age, gender FROM customers")
        .fetch_all(&state.pool)
        .await?;

    let mut preferences: BTreeMap<&'static str, BTreeMap<&'static str, Vec<CategoryStat>>> =
        BTreeMap::new();
    for row in &cohorts {
        let (Some(bucket), Some(cohort)) =
            (age_bucket(row.age), gender_cohort(row.gender.as_deref()))
        else {
            continue;
        };
        preferences
            .entry(bucket)
            .or_default()
            .entry(cohort)
            .or_default();
    }

    let rows: Vec<CategoryByCohortRow> = sqlx::query_as(
        r#"
SELECT
    c.age,
    c.gender,
    pr.category,
    SUM(pi.quantity)::int8 AS total_quantity,
    SUM(pi.price_at_purchase)::float8 AS total_revenue
FROM purchase_items pi
JOIN purchases p ON p.id = pi.purchase_id
JOIN customers c ON c.id = p.customer_id
JOIN products pr ON pr.id = pi.product_id
GROUP BY c.age, c.gender, pr.category
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    // Several ages share a bucket, so category stats are merged again here.
    let mut merged: HashMap<(&'static str, &'static str, String), (i64, f64)> = HashMap::new();
    for row in rows {
        let (Some(bucket), Some(cohort)) =
            (age_bucket(row.age), gender_cohort(row.gender.as_deref()))
        else {
            continue;
        };
        let entry = merged.entry((bucket, cohort, row.category)).or_default();
        entry.0 += row.total_quantity;
        entry.1 += row.total_revenue;
    }

    for ((bucket, cohort, category), (total_quantity, total_revenue)) in merged {
        preferences
            .entry(bucket)
            .or_default()
            .entry(cohort)
            .or_default()
            .push(CategoryStat {
                category,
                total_quantity,
                total_revenue,
            });
    }

    for cohorts in preferences.values_mut() {
        for stats in cohorts.values_mut() {
            stats.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
        }
    }

    Ok(Json(CategoryPreferencesResponse {
        message: "Category preferences by age and gender retrieved successfully.",
        preferences,
    }))
}

#[derive(Serialize)]
pub struct AnalyticsSummary {
    pub total_customers: i64,
    pub total_products: i64,
    pub total_purchases: i64,
    pub total_revenue: f64,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct TopCategory {
    pub category: String,
    pub quantity_sold: i64,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct TopCustomer {
    pub name: Option<String>,
    pub total_spent: f64,
}

#[derive(Serialize)]
pub struct BasicAnalyticsResponse {
    pub summary: AnalyticsSummary,
    pub top_categories: Vec<TopCategory>,
    pub top_customers: Vec<TopCustomer>,
}

#[instrument(skip_all)]
pub async fn basic_analytics(
    State(state): State<AppState>,
) -> Result<Json<BasicAnalyticsResponse>, ApiError> {
    let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&state.pool)
        .await?;
    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&state.pool)
        .await?;
    let total_purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
        .fetch_one(&state.pool)
        .await?;
    let total_revenue: f64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0)::float8 FROM purchases")
            .fetch_one(&state.pool)
            .await?;

    let top_categories: Vec<TopCategory> = sqlx::query_as(
        r#"
SELECT pr.category, SUM(pi.quantity)::int8 AS quantity_sold
FROM purchase_items pi
JOIN products pr ON pr.id = pi.product_id
GROUP BY pr.category
ORDER BY quantity_sold DESC
LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let top_customers: Vec<TopCustomer> = sqlx::query_as(
        r#"
SELECT c.name, SUM(p.total_amount)::float8 AS total_spent
FROM purchases p
JOIN customers c ON c.id = p.customer_id
GROUP BY c.id, c.name
ORDER BY total_spent DESC
LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(BasicAnalyticsResponse {
        summary: AnalyticsSummary {
            total_customers,
            total_products,
            total_purchases,
            total_revenue,
        },
        top_categories,
        top_customers,
    }))
}
