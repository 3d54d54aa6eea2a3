use std::path::PathBuf;

use anyhow::Result;
use axum::Router;
use envconfig::Envconfig;
use sqlx::postgres::PgPoolOptions;

use analytics_api::config::Config;
use analytics_api::router;

async fn listen(app: Router, bind: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("failed to load configuration from env");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_pg_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to postgres");

    let app = router::router(
        pool,
        PathBuf::from(&config.media_dir),
        config.export_prometheus,
    );

    tracing::info!("listening on {}", config.bind());
    match listen(app, config.bind()).await {
        Ok(_) => {}
        Err(e) => tracing::error!("failed to start analytics-api http server, {}", e),
    }
}
