use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use matreq_db::Database;
use matreq_server::routes;
use matreq_server::state::AppState;
use matreq_server::token::TokenKeys;

pub const TEST_SECRET: &str = "test-jwt-secret";

/// SQL migration statements, executed one at a time.
const MIGRATIONS: &[&str] = &[
    // 0001_users.sql
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        email VARCHAR NOT NULL UNIQUE,
        password_hash VARCHAR NOT NULL,
        role VARCHAR(20) NOT NULL DEFAULT 'supervisor',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT chk_users_role CHECK (
            role IN ('admin', 'supervisor', 'purchaser', 'accounts', 'qa')
        )
    )"#,
    // 0002_sites.sql
    r#"CREATE TABLE IF NOT EXISTS sites (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        address VARCHAR NOT NULL,
        client_name VARCHAR,
        city VARCHAR,
        province VARCHAR,
        plot_size VARCHAR,
        status VARCHAR(20) NOT NULL DEFAULT 'active',
        updated_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT chk_sites_status CHECK (
            status IN ('active', 'on_hold', 'completed')
        )
    )"#,
    r#"CREATE TABLE IF NOT EXISTS site_supervisors (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        site_id UUID NOT NULL REFERENCES sites(id),
        user_id UUID NOT NULL REFERENCES users(id),
        status VARCHAR(20)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS site_purchasers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        site_id UUID NOT NULL REFERENCES sites(id),
        user_id UUID NOT NULL REFERENCES users(id),
        status VARCHAR(20),
        material_type VARCHAR
    )"#,
    // 0003_requests.sql
    r#"CREATE TABLE IF NOT EXISTS requests (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        site_id UUID NOT NULL REFERENCES sites(id),
        material_name VARCHAR NOT NULL,
        unit VARCHAR(50) NOT NULL,
        released_qty DOUBLE PRECISION NOT NULL DEFAULT 0,
        comments TEXT,
        status VARCHAR(20) NOT NULL DEFAULT 'pending',
        current_department VARCHAR(20) NOT NULL DEFAULT 'supervisor',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS request_departments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        request_id UUID NOT NULL REFERENCES requests(id),
        department VARCHAR(20) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'pending',
        comments TEXT,
        user_id UUID REFERENCES users(id),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_request_departments UNIQUE (request_id, department)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS request_history (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        request_id UUID NOT NULL REFERENCES requests(id),
        department VARCHAR(20) NOT NULL,
        user_id UUID REFERENCES users(id),
        received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        forwarded_at TIMESTAMPTZ
    )"#,
];

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up a PostgreSQL container and return the app router plus the
/// container handle (dropping it stops the database).
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "matreq_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/matreq_test");
    let pool = retry_connect(&url).await;

    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    let state = Arc::new(AppState {
        db: Database::from_pool(pool.clone()),
        tokens: TokenKeys::new(TEST_SECRET),
    });

    TestApp {
        router: routes::router(state),
        pool,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

// ---------------------------------------------------------------------------
// Request/response helpers
// ---------------------------------------------------------------------------

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn authed_json_request(
    method: Method,
    uri: &str,
    token: &str,
    body: &serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authed_empty_request(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and log in, returning the session token.
pub async fn register_and_login(router: &Router, name: &str, email: &str, role: &str) -> String {
    let create = serde_json::json!({
        "name": name,
        "email": email,
        "password": "hunter2!",
        "role": role,
    });
    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &create))
        .await
        .unwrap();
    assert_eq!(response.status(), 201, "user creation failed");

    let login = serde_json::json!({"email": email, "password": "hunter2!"});
    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user/login", &login))
        .await
        .unwrap();
    assert_eq!(response.status(), 200, "login failed");

    let json = body_json(response).await;
    json["token"].as_str().expect("login token missing").to_string()
}
