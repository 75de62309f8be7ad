//! GreenThumb Market service entry point.

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greenthumb_market::config::Config;
use greenthumb_market::payment::MercadoPago;
use greenthumb_market::{routes, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let port = config.port;

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let gateway = Arc::new(MercadoPago::new(&config.mercado_pago)?);
    let state = AppState { db, gateway, config: Arc::new(config) };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "greenthumb-market"})) }))
        .route("/api/v1/products", get(routes::products::list).post(routes::products::create))
        .route(
            "/api/v1/products/:id",
            get(routes::products::get).put(routes::products::update).delete(routes::products::discontinue),
        )
        .route("/api/v1/categories", get(routes::categories::list).post(routes::categories::create))
        .route("/api/v1/customers", post(routes::customers::register))
        .route("/api/v1/customers/:id", get(routes::customers::get).delete(routes::customers::deactivate))
        .route("/api/v1/cart/:customer_id", get(routes::cart::list).delete(routes::cart::clear))
        .route("/api/v1/cart/:customer_id/items", post(routes::cart::add))
        .route(
            "/api/v1/cart/:customer_id/items/:product_id",
            put(routes::cart::update).delete(routes::cart::remove),
        )
        .route("/api/v1/orders", get(routes::orders::list))
        .route("/api/v1/orders/:id", get(routes::orders::get))
        .route("/api/v1/orders/:id/status", put(routes::orders::update_status))
        .route("/api/v1/checkout", post(routes::checkout::confirm))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("🚀 GreenThumb Market listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
