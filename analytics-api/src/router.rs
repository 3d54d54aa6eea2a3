use std::future::ready;
use std::path::PathBuf;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::handlers::{analytics, listings, segmentation};
use crate::metrics::{setup_metrics_recorder, track_metrics};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub media_dir: PathBuf,
}

async fn index() -> &'static str {
    "analytics-api"
}

pub fn router(pool: PgPool, media_dir: PathBuf, metrics: bool) -> Router {
    let state = AppState { pool, media_dir };

    let router = Router::new()
        .route("/", get(index))
        .route("/api/upload/", post(segmentation::upload_csv))
        .route(
            "/api/segment-customers/",
            get(segmentation::segment_customers),
        )
        .route(
            "/api/segment-customers-external/",
            get(segmentation::segment_customers_external),
        )
        .route("/api/top-products/", get(analytics::top_products))
        .route("/api/discount-usage/", get(analytics::discount_usage))
        .route(
            "/api/category-preferences/",
            get(analytics::category_preferences),
        )
        .route("/api/basic-analytics/", get(analytics::basic_analytics))
        .route("/api/customers/", get(listings::customers))
        .route("/api/products/", get(listings::products))
        .route("/api/purchases/", get(listings::purchases))
        .route("/api/purchase-items/", get(listings::purchase_items))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to.
    // Installing a global recorder when the router is used as a library
    // (during tests etc) does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
