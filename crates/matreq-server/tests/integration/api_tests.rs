use axum::http::{Method, StatusCode};
use tower::ServiceExt;

use crate::common::{
    authed_json_request, body_json, empty_request, json_request, register_and_login,
    setup_test_app,
};

#[tokio::test]
async fn create_user_returns_201_with_sanitized_body() {
    let app = setup_test_app().await;

    let payload = serde_json::json!({
        "name": "Penny Purchaser",
        "email": "penny@example.com",
        "password": "s3cret-pw",
        "role": "purchaser",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["status"], 201);
    assert_eq!(json["message"], "User created successfully");
    assert_eq!(json["data"]["email"], "penny@example.com");
    assert_eq!(json["data"]["role"], "purchaser");
    assert!(json["id"].is_string());
    // the hash must never cross the API boundary
    assert!(json["data"].get("password_hash").is_none());
    assert!(json["data"].get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_returns_409() {
    let app = setup_test_app().await;
    register_and_login(&app.router, "Penny", "penny@example.com", "purchaser").await;

    let payload = serde_json::json!({
        "name": "Other Penny",
        "email": "penny@example.com",
        "password": "another-pw",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_required_field_returns_400() {
    let app = setup_test_app().await;

    let payload = serde_json::json!({
        "name": "  ",
        "email": "blank@example.com",
        "password": "pw",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "name is required");
}

#[tokio::test]
async fn user_crud_roundtrip() {
    let app = setup_test_app().await;

    let payload = serde_json::json!({
        "name": "Quinn QA",
        "email": "quinn@example.com",
        "password": "inspect-all",
        "role": "qa",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &payload))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Read back
    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, &format!("/api/v1/user/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Quinn QA");

    // Rename
    let patch = serde_json::json!({"name": "Quinn Quality"});
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/user/{id}"),
            &patch,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "User updated");
    assert_eq!(json["data"]["name"], "Quinn Quality");
    assert_eq!(json["data"]["role"], "qa");

    // Delete, then the lookup misses
    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::DELETE, &format!("/api/v1/user/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, &format!("/api/v1/user/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["message"], "User not found");
}

#[tokio::test]
async fn request_against_unknown_site_returns_404() {
    let app = setup_test_app().await;

    let payload = serde_json::json!({
        "site_id": uuid::Uuid::new_v4(),
        "material_name": "Rebar 12mm",
        "unit": "ton",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/request", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Site not found");
}

async fn create_site(app: &crate::common::TestApp, token: &str) -> String {
    let payload = serde_json::json!({
        "name": "Harbor Works",
        "address": "1 Dock Street",
        "supervisors": [],
        "purchasers": [],
    });
    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            Method::POST,
            "/api/v1/site",
            token,
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn request_lifecycle_with_departments_and_history() {
    let app = setup_test_app().await;
    let token = register_and_login(&app.router, "Ada Admin", "ada@example.com", "admin").await;
    let site_id = create_site(&app, &token).await;

    // Create with one department card and one hand-off entry
    let payload = serde_json::json!({
        "site_id": site_id,
        "material_name": "Cement OPC",
        "unit": "bag",
        "released_qty": 240.0,
        "current_department": "purchaser",
        "departments": [
            {"department": "purchaser", "comments": "sourcing quotes"}
        ],
        "history": [
            {"department": "supervisor"}
        ],
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/request", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id = json["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["site"]["name"], "Harbor Works");
    assert_eq!(json["data"]["departments"][0]["department"], "purchaser");
    assert_eq!(json["data"]["departments"][0]["status"], "pending");
    assert_eq!(json["data"]["history"][0]["department"], "supervisor");

    // Upsert the purchaser card and move the request along
    let patch = serde_json::json!({
        "status": "in_progress",
        "current_department": "accounts",
        "departments": [
            {"department": "purchaser", "status": "approved", "comments": "vendor picked"}
        ],
        "history": [
            {"department": "purchaser"}
        ],
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/request/{id}"),
            &patch,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "in_progress");
    assert_eq!(json["data"]["current_department"], "accounts");
    // still a single purchaser card, now approved
    let cards = json["data"]["departments"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["status"], "approved");
    assert_eq!(json["data"]["history"].as_array().unwrap().len(), 2);

    // Delete and confirm the aggregate is gone
    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            Method::DELETE,
            &format!("/api/v1/request/{id}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, &format!("/api/v1/request/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // no orphaned sub-records survive the cascade
    let (cards,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM request_departments")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let (history,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM request_history")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(cards, 0);
    assert_eq!(history, 0);
}

#[tokio::test]
async fn site_with_requests_refuses_deletion() {
    let app = setup_test_app().await;
    let token = register_and_login(&app.router, "Ada Admin", "ada@example.com", "admin").await;
    let site_id = create_site(&app, &token).await;

    let payload = serde_json::json!({
        "site_id": site_id,
        "material_name": "Sand",
        "unit": "cubic meter",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/request", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            Method::DELETE,
            &format!("/api/v1/site/{site_id}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn site_crew_is_served_with_user_details() {
    let app = setup_test_app().await;
    let token = register_and_login(&app.router, "Ada Admin", "ada@example.com", "admin").await;

    // A supervisor to assign
    let payload = serde_json::json!({
        "name": "Sam Site",
        "email": "sam@example.com",
        "password": "pw-on-site",
        "role": "supervisor",
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/user", &payload))
        .await
        .unwrap();
    let sam_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let payload = serde_json::json!({
        "name": "Hillside Towers",
        "address": "99 Ridge Lane",
        "supervisors": [{"user_id": sam_id, "status": "active"}],
        "purchasers": [],
    });
    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            Method::POST,
            "/api/v1/site",
            &token,
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/v1/site"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let supervisors = json["data"][0]["supervisors"].as_array().unwrap();
    assert_eq!(supervisors.len(), 1);
    assert_eq!(supervisors[0]["user"]["email"], "sam@example.com");
    assert!(supervisors[0]["user"].get("password_hash").is_none());
}
