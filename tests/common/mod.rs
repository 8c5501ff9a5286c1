//! Shared helpers for the Postgres-backed integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -- --ignored

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Once;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use tienda_pos_backend::auth::jwt::Claims;
use tienda_pos_backend::config::Config;
use tienda_pos_backend::{database, routes, state::AppState};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

static INIT: Once = Once::new();
static NEXT_TENANT: AtomicI64 = AtomicI64::new(0);

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,tienda_pos_backend=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: PgPool,
}

/// Connects to `TEST_DATABASE_URL`, runs migrations and builds the full router.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run the Postgres tests");

    let config = Config {
        database_url,
        jwt_secret: SECRET.to_string(),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        db_max_connections: 20,
        tx_timeout: Duration::from_secs(10),
    };

    let pool = database::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to the test database");
    database::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(pool.clone(), &config);
    TestApp { router: routes::create_router(state.clone()), state, pool }
}

/// A business id no other test run has used.
pub fn fresh_tenant() -> i64 {
    // seeded once per run so reruns against the same database do not collide
    let _ = NEXT_TENANT.compare_exchange(0, Utc::now().timestamp_micros(), Ordering::SeqCst, Ordering::SeqCst);
    NEXT_TENANT.fetch_add(1, Ordering::SeqCst)
}

pub fn bearer(user_id: i64, tenant_id: Option<i64>, role: &str) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        tenant_id,
        role: role.to_string(),
        name: format!("user-{user_id}"),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("Failed to sign token");
    format!("Bearer {token}")
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn insert_user(pool: &PgPool, tenant_id: Option<i64>, name: &str, role: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (tenant_id, name, email, role)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(format!("{}-{}-{}@pos.test", name.to_lowercase().replace(' ', "."), tenant_id.unwrap_or(0), Utc::now().timestamp_micros()))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to insert user")
}

pub async fn insert_product(pool: &PgPool, tenant_id: i64, sale: Decimal, cost: Decimal, stock: i32) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO products (tenant_id, name, sale_price, cost_price, stock_quantity)
         VALUES ($1, 'Test product', $2, $3, $4) RETURNING id",
    )
    .bind(tenant_id)
    .bind(sale)
    .bind(cost)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to insert product")
}

pub async fn stock_of(pool: &PgPool, product_id: i64) -> Option<i32> {
    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await
        .expect("Failed to read stock")
}

pub async fn invoice_count(pool: &PgPool, tenant_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count invoices")
}

pub async fn line_item_count(pool: &PgPool, invoice_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM invoice_line_items WHERE invoice_id = $1")
        .bind(invoice_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count line items")
}

pub async fn send(app: &Router, method: &str, uri: &str, auth: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
