//! End-to-end checkout scenarios against a real PostgreSQL database.
//!
//! These tests need a running Postgres. Point TEST_DATABASE_URL (or
//! DATABASE_URL) at an empty database and run `cargo test -- --ignored`.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use greenthumb_market::checkout::{confirm_cart, CheckoutCommand};
use greenthumb_market::config::{Config, MercadoPagoConfig};
use greenthumb_market::error::ApiError;
use greenthumb_market::payment::{
    BackUrls, GatewayError, PaymentGateway, PreferenceHandle, PreferenceRequest,
};

/// Accepts every preference and records what it was asked to charge.
#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<PreferenceRequest>>,
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_preference(&self, request: PreferenceRequest) -> Result<PreferenceHandle, GatewayError> {
        self.calls.lock().unwrap().push(request);
        Ok(PreferenceHandle {
            preference_id: "pref-test".into(),
            init_point: Some("https://www.mercadopago.com/init/pref-test".into()),
            sandbox_init_point: None,
        })
    }
}

/// Rejects every preference the way a broken remote API would.
struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn create_preference(&self, _request: PreferenceRequest) -> Result<PreferenceHandle, GatewayError> {
        Err(GatewayError::Api { status: 500, body: "upstream exploded".into() })
    }
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        port: 0,
        admin_email: "admin@greenthumb.example".into(),
        mercado_pago: MercadoPagoConfig {
            base_url: "http://localhost:0".into(),
            access_token: "TEST-TOKEN".into(),
            timeout: Duration::from_secs(1),
        },
        back_urls: BackUrls {
            success: "http://localhost:3000/payment-success".into(),
            failure: "http://localhost:3000/payment-failure".into(),
            pending: "http://localhost:3000/payment-pending".into(),
        },
    }
}

async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set TEST_DATABASE_URL or DATABASE_URL");
    let pool = PgPool::connect(&url).await.expect("connect to Postgres");
    sqlx::migrate!("./migrations").run(&pool).await.expect("run migrations");
    pool
}

async fn seed_customer(pool: &PgPool) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id, email, role, first_name, last_name) VALUES ($1, $2, 'customer', 'Rosa', 'Quintana')")
        .bind(id)
        .bind(format!("rosa+{id}@example.com"))
        .execute(pool)
        .await
        .expect("seed customer");
    id
}

async fn seed_product(pool: &PgPool, price: Decimal, stock: i32) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO products (id, name, sell_price, stock_on_hand) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("Fern {id}"))
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await
        .expect("seed product");
    id
}

async fn seed_cart_line(pool: &PgPool, customer: Uuid, product: Uuid, quantity: i32, snapshot: Option<Decimal>) {
    sqlx::query("INSERT INTO cart_items (customer_id, product_id, quantity, price_snapshot) VALUES ($1, $2, $3, $4)")
        .bind(customer)
        .bind(product)
        .bind(quantity)
        .bind(snapshot)
        .execute(pool)
        .await
        .expect("seed cart line");
}

async fn stock_of(pool: &PgPool, product: Uuid) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock_on_hand FROM products WHERE id = $1")
        .bind(product)
        .fetch_one(pool)
        .await
        .expect("stock");
    stock
}

async fn cart_line_count(pool: &PgPool, customer: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE customer_id = $1")
        .bind(customer)
        .fetch_one(pool)
        .await
        .expect("cart count");
    count
}

async fn order_count(pool: &PgPool, customer: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
        .bind(customer)
        .fetch_one(pool)
        .await
        .expect("order count");
    count
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn confirming_a_cart_decrements_stock_freezes_prices_and_empties_the_cart() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let product = seed_product(&pool, Decimal::new(1000, 2), 5).await;
    seed_cart_line(&pool, customer, product, 2, Some(Decimal::new(1000, 2))).await;

    // The catalog price drifts after the snapshot was taken; billing must
    // not follow it.
    sqlx::query("UPDATE products SET sell_price = $2 WHERE id = $1")
        .bind(product)
        .bind(Decimal::new(9999, 2))
        .execute(&pool)
        .await
        .expect("drift price");

    let gateway = RecordingGateway::default();
    let confirmed = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand {
            customer_id: customer,
            payment_method: "mercado_pago".into(),
            customer_notes: Some("leave at the door".into()),
        },
    )
    .await
    .expect("checkout succeeds");

    assert_eq!(stock_of(&pool, product).await, 3);
    assert_eq!(cart_line_count(&pool, customer).await, 0);
    assert_eq!(order_count(&pool, customer).await, 1);
    assert_eq!(confirmed.preference.preference_id, "pref-test");

    let (quantity, unit_price): (i32, Option<Decimal>) =
        sqlx::query_as("SELECT quantity, unit_price FROM order_items WHERE order_id = $1")
            .bind(confirmed.order_id)
            .fetch_one(&pool)
            .await
            .expect("order item");
    assert_eq!(quantity, 2);
    assert_eq!(unit_price, Some(Decimal::new(1000, 2)));

    let (status,): (String,) = sqlx::query_as(
        "SELECT s.name FROM orders o JOIN order_statuses s ON s.id = o.status_id WHERE o.id = $1",
    )
    .bind(confirmed.order_id)
    .fetch_one(&pool)
    .await
    .expect("order status");
    assert_eq!(status, "Pending");

    let calls = gateway.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].items.len(), 1);
    assert_eq!(calls[0].items[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(calls[0].payer.name, "Rosa");
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn insufficient_stock_aborts_the_whole_checkout() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let product = seed_product(&pool, Decimal::new(500, 2), 3).await;
    seed_cart_line(&pool, customer, product, 10, Some(Decimal::new(500, 2))).await;

    let gateway = RecordingGateway::default();
    let err = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand { customer_id: customer, payment_method: "cash".into(), customer_notes: None },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidState(_)), "got {err:?}");
    assert_eq!(stock_of(&pool, product).await, 3);
    assert_eq!(order_count(&pool, customer).await, 0);
    assert_eq!(cart_line_count(&pool, customer).await, 1);
    assert!(gateway.calls.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn a_cart_with_nothing_billable_rolls_back_entirely() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let product = seed_product(&pool, Decimal::ZERO, 4).await;
    seed_cart_line(&pool, customer, product, 1, Some(Decimal::ZERO)).await;

    let gateway = RecordingGateway::default();
    let err = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand { customer_id: customer, payment_method: "cash".into(), customer_notes: None },
    )
    .await
    .unwrap_err();

    match err {
        ApiError::InvalidState(msg) => assert!(msg.contains("nothing to charge"), "got {msg}"),
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert_eq!(stock_of(&pool, product).await, 4);
    assert_eq!(order_count(&pool, customer).await, 0);
    assert_eq!(cart_line_count(&pool, customer).await, 1);
    assert!(gateway.calls.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn a_gateway_failure_leaves_no_observable_side_effect() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let product = seed_product(&pool, Decimal::new(1500, 2), 6).await;
    seed_cart_line(&pool, customer, product, 2, Some(Decimal::new(1500, 2))).await;

    let err = confirm_cart(
        &pool,
        &FailingGateway,
        &test_config(),
        CheckoutCommand { customer_id: customer, payment_method: "mercado_pago".into(), customer_notes: None },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::PaymentGateway(_)), "got {err:?}");
    assert_eq!(stock_of(&pool, product).await, 6);
    assert_eq!(order_count(&pool, customer).await, 0);
    assert_eq!(cart_line_count(&pool, customer).await, 1);
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn free_lines_are_recorded_but_never_billed() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let paid = seed_product(&pool, Decimal::new(2000, 2), 5).await;
    let free = seed_product(&pool, Decimal::ZERO, 5).await;
    seed_cart_line(&pool, customer, paid, 1, Some(Decimal::new(2000, 2))).await;
    seed_cart_line(&pool, customer, free, 3, Some(Decimal::ZERO)).await;

    let gateway = RecordingGateway::default();
    let confirmed = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand { customer_id: customer, payment_method: "mercado_pago".into(), customer_notes: None },
    )
    .await
    .expect("checkout succeeds");

    // Both lines are on the order and both consumed stock.
    let (item_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
        .bind(confirmed.order_id)
        .fetch_one(&pool)
        .await
        .expect("item count");
    assert_eq!(item_count, 2);
    assert_eq!(stock_of(&pool, paid).await, 4);
    assert_eq!(stock_of(&pool, free).await, 2);

    // Only the priced line reached the gateway.
    let calls = gateway.calls.lock().unwrap();
    assert_eq!(calls[0].items.len(), 1);
    assert_eq!(calls[0].items[0].product_id, paid);
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn an_empty_cart_cannot_be_confirmed() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;

    let gateway = RecordingGateway::default();
    let err = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand { customer_id: customer, payment_method: "cash".into(), customer_notes: None },
    )
    .await
    .unwrap_err();

    match err {
        ApiError::InvalidState(msg) => assert!(msg.contains("cart is empty"), "got {msg}"),
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn an_unknown_customer_is_rejected_before_any_write() {
    let pool = test_pool().await;

    let gateway = RecordingGateway::default();
    let err = confirm_cart(
        &pool,
        &gateway,
        &test_config(),
        CheckoutCommand { customer_id: Uuid::now_v7(), payment_method: "cash".into(), customer_notes: None },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL; set TEST_DATABASE_URL and run with --ignored"]
async fn concurrent_checkouts_for_one_customer_serialize() {
    let pool = test_pool().await;
    let customer = seed_customer(&pool).await;
    let product = seed_product(&pool, Decimal::new(1000, 2), 10).await;
    seed_cart_line(&pool, customer, product, 2, Some(Decimal::new(1000, 2))).await;

    let gateway = RecordingGateway::default();
    let config = test_config();
    let command = || CheckoutCommand {
        customer_id: customer,
        payment_method: "mercado_pago".into(),
        customer_notes: None,
    };

    let (first, second) = tokio::join!(
        confirm_cart(&pool, &gateway, &config, command()),
        confirm_cart(&pool, &gateway, &config, command()),
    );

    // Exactly one side wins; the loser observes the emptied cart.
    let (wins, losses): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(Result::is_ok);
    assert_eq!(wins.len(), 1, "exactly one checkout should succeed");
    match losses.into_iter().next().map(Result::unwrap_err) {
        Some(ApiError::InvalidState(msg)) => assert!(msg.contains("cart is empty"), "got {msg}"),
        other => panic!("expected InvalidState(cart is empty), got {other:?}"),
    }

    // The cart line was consumed once, not twice.
    assert_eq!(stock_of(&pool, product).await, 8);
    assert_eq!(order_count(&pool, customer).await, 1);
    assert_eq!(cart_line_count(&pool, customer).await, 0);
    assert_eq!(gateway.calls.lock().unwrap().len(), 1);
}
