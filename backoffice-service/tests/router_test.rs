//! Router behavior that is settled before any database query: caller
//! identity, permission checks, input binding and the activity trail.

mod common;

use axum::http::StatusCode;
use backoffice_service::permissions as perm;
use backoffice_service::services::{init_metrics, MemoryActivityLog, StaticPermissions};
use common::{get, json_body, router, send_json};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

const CLERK: &str = "clerk@shop.test";

#[tokio::test]
async fn test_missing_caller_header_is_unauthorized() {
    let log = Arc::new(MemoryActivityLog::new());
    let app = router(Arc::new(StaticPermissions::new()), log.clone());

    let response = app.oneshot(get("/item", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing X-User-Email header");
    assert!(log.entries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_denied_request_is_forbidden_and_logged() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::item::LIST]);
    let app = router(Arc::new(permissions), log.clone());

    let response = app.oneshot(get("/item/7", Some(CLERK))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Permission denied");
    assert_eq!(
        log.actions_for(CLERK),
        vec![
            "Attempting to get item by id".to_string(),
            "Permission denied for GetItemByID".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_permission_lookup_ignores_email_case() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant("Clerk@Shop.test", [perm::item::SEARCH_BY_ID]);
    let app = router(Arc::new(permissions), log);

    // Passing the gate lands on the blank-term check, not on 403.
    let response = app
        .oneshot(get("/item/searchById?id=", Some(CLERK)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_search_term_is_bad_request() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::customer::SEARCH_BY_NAME]);
    let app = router(Arc::new(permissions), log.clone());

    let response = app
        .clone()
        .oneshot(get("/customers/searchByName?name=%20%20", Some(CLERK)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/customers/searchByName", Some(CLERK)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let actions = log.actions_for(CLERK);
    assert_eq!(actions.len(), 4);
    assert_eq!(actions[1], "Invalid input: missing query parameter");
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::appointment::GET_BY_ID]);
    let app = router(Arc::new(permissions), log.clone());

    let response = app
        .oneshot(get("/appointments/abc", Some(CLERK)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let actions = log.actions_for(CLERK);
    assert!(actions[1].starts_with("Invalid input:"));
}

#[tokio::test]
async fn test_invalid_body_fails_validation() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::appointment::CREATE]);
    let app = router(Arc::new(permissions), log);

    let response = app
        .oneshot(send_json(
            "POST",
            "/appointments",
            CLERK,
            json!({ "date_time": "2024-05-14T10:00:00", "customer_id": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation error");
}

#[tokio::test]
async fn test_appointment_off_the_hour_is_rejected() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::appointment::CREATE]);
    let app = router(Arc::new(permissions), log.clone());

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/appointments",
            CLERK,
            json!({ "date_time": "2024-05-14T10:30:00", "customer_id": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 18:00 is past the last bookable slot.
    let response = app
        .oneshot(send_json(
            "POST",
            "/appointments",
            CLERK,
            json!({ "date_time": "2024-05-14T18:00:00", "customer_id": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let actions = log.actions_for(CLERK);
    assert_eq!(actions.len(), 4);
    assert!(actions[1].starts_with("Failed: Bad request"));
    assert!(actions[3].starts_with("Failed: Bad request"));
}

#[tokio::test]
async fn test_purchase_order_without_items_fails_validation() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::purchase_order::CREATE]);
    let app = router(Arc::new(permissions), log);

    let response = app
        .oneshot(send_json(
            "POST",
            "/purchase-orders",
            CLERK,
            json!({ "items": [], "customer_id": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_failed_activity_log_refuses_request() {
    let log = Arc::new(MemoryActivityLog::failing());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::item::LIST]);
    let app = router(Arc::new(permissions), log);

    let response = app.oneshot(get("/item", Some(CLERK))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "Error registering log");
}

#[tokio::test]
async fn test_unreachable_database_is_reported_as_server_error() {
    let log = Arc::new(MemoryActivityLog::new());
    let permissions = StaticPermissions::new().grant(CLERK, [perm::item::LIST]);
    let app = router(Arc::new(permissions), log.clone());

    let response = app.oneshot(get("/item", Some(CLERK))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let actions = log.actions_for(CLERK);
    assert_eq!(actions.len(), 2);
    assert!(actions[1].starts_with("Failed:"));
}

#[tokio::test]
async fn test_health_reports_unavailable_database() {
    let app = router(
        Arc::new(StaticPermissions::new()),
        Arc::new(MemoryActivityLog::new()),
    );

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["service"], "backoffice-service");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = router(
        Arc::new(StaticPermissions::new()),
        Arc::new(MemoryActivityLog::new()),
    );

    let response = app
        .oneshot(get("/.well-known/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/appointments"]["post"].is_object());
    assert!(body["paths"]["/purchase-orders/{id}/state"]["patch"].is_object());
    assert!(body["paths"]["/billing/total"]["post"].is_object());
    assert_eq!(
        body["components"]["securitySchemes"]["caller_email"]["name"],
        "x-user-email"
    );
}

#[tokio::test]
async fn test_metrics_count_permission_denials() {
    init_metrics();
    let permissions = Arc::new(StaticPermissions::new());
    let log = Arc::new(MemoryActivityLog::new());
    let app = router(permissions, log);

    let response = app
        .clone()
        .oneshot(get("/sales-report?from=2024-01-01&to=2024-01-31", Some(CLERK)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("backoffice_permission_denials_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = router(
        Arc::new(StaticPermissions::new()),
        Arc::new(MemoryActivityLog::new()),
    );

    let mut request = get("/item", None);
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    assert!(response.headers().contains_key("x-content-type-options"));
}
