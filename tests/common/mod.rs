#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use mps_api::{
    config::AppConfig,
    db,
    entities::{order_book, plan},
    services::{orders::OrderRequest, plans::PlanRequest},
    AppState,
};
use sea_orm::ConnectionTrait;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "k3V9qLr7TzX2mWc8NpB4sYh6JdF1gRa5UeQ0vKt9LxZ3nMb7PwC2yHj6SdG4fTq8";
pub const TEST_USER: &str = "planner";
pub const TEST_PASSWORD: &str = "line-4-morning-shift";

/// Helper harness backed by a throwaway SQLite file with the schema applied.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Same as [`TestApp::new`] with `max_connections` pooled connections.
    /// File-backed SQLite runs in WAL mode with a busy timeout, so several
    /// transactions can be open at once.
    pub async fn with_pool_size(max_connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("mps_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        // persistent for the file, so every pooled connection picks it up
        pool.execute_unprepared("PRAGMA journal_mode=WAL")
            .await
            .expect("switch test database to WAL");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        state
            .auth
            .create_user(TEST_USER, TEST_PASSWORD)
            .await
            .expect("seed test user");

        let token = state
            .auth
            .login(&mps_api::auth::LoginCredentials {
                username: TEST_USER.to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("login test user")
            .token;

        let router = mps_api::app_router(state.clone()).expect("build router");

        Self {
            router,
            state,
            token,
            _dir: dir,
        }
    }

    /// Access the bearer token for the seeded user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn seed_order(&self, order_qty: i32) -> order_book::Model {
        self.state
            .services
            .orders
            .create(OrderRequest {
                customer_name: Some("Acme Writing Instruments".into()),
                product: Some("BP-07".into()),
                order_qty: Some(order_qty),
                ..Default::default()
            })
            .await
            .expect("seed order")
    }

    pub async fn seed_plan(
        &self,
        target_qty: i32,
        order_id: Option<i32>,
        status: &str,
    ) -> plan::Model {
        self.state
            .services
            .plans
            .create(PlanRequest {
                location: Some("Plant 1".into()),
                unit: Some("U1".into()),
                status: Some(status.into()),
                code: Some("BP-07".into()),
                target_qty: Some(target_qty),
                order_id,
                ..Default::default()
            })
            .await
            .expect("seed plan")
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// A complete, valid production entry payload as clients send it
pub fn entry_json(plan_id: i32, quantity: i32) -> Value {
    serde_json::json!({
        "planId": plan_id,
        "productionDate": "2024-06-03",
        "shift": "A",
        "machineNumber": "M-12",
        "quantity": quantity,
        "operatorName": "R. Iyer"
    })
}
