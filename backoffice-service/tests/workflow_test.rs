//! End-to-end workflows against PostgreSQL.
//!
//! Run with a disposable database:
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

mod common;

use chrono::{Days, NaiveDate};
use common::{TestApp, ADMIN_EMAIL};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

/// A day far from any other run, so slots rarely collide across runs.
fn fresh_day() -> NaiveDate {
    let offset = (uuid::Uuid::new_v4().as_u128() % 20_000) as u64;
    NaiveDate::from_ymd_opt(2100, 1, 1).unwrap() + Days::new(offset)
}

#[tokio::test]
#[ignore]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "backoffice-service");
}

#[tokio::test]
#[ignore]
async fn seeded_admin_holds_every_permission() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!("/user/{}/permissions/23001", ADMIN_EMAIL))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["granted"], true);

    let response = app
        .get(&format!("/logs/{}", ADMIN_EMAIL))
        .send()
        .await
        .expect("Failed to execute request");
    let logs: Value = response.json().await.expect("Failed to parse JSON");
    assert!(logs.as_array().is_some_and(|entries| !entries.is_empty()));
}

#[tokio::test]
#[ignore]
async fn unknown_caller_is_forbidden() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/item", app.address))
        .header("x-user-email", "nobody@shop.test")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
#[ignore]
async fn slot_capacity_and_double_booking_are_enforced() {
    let app = TestApp::spawn().await;
    let first = app.create_customer().await;
    let second = app.create_customer().await;
    let day = fresh_day();
    let slot = format!("{}T10:00:00", day);

    let response = app
        .post("/appointments")
        .json(&json!({ "date_time": slot, "customer_id": first }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let booked: Value = response.json().await.expect("Failed to parse JSON");

    // Same customer, same slot.
    let response = app
        .post("/appointments")
        .json(&json!({ "date_time": slot, "customer_id": first }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    // Capacity is one per slot in the test configuration.
    let response = app
        .post("/appointments")
        .json(&json!({ "date_time": slot, "customer_id": second }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    // Moving the appointment onto its own slot is not a conflict.
    let response = app
        .put(&format!("/appointments/{}", booked["id"]))
        .json(&json!({ "date_time": slot, "customer_id": first, "state": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .get(&format!("/appointments/hours?date={}", day))
        .send()
        .await
        .expect("Failed to execute request");
    let hours: Vec<Value> = response.json().await.expect("Failed to parse JSON");
    assert_eq!(hours.len(), 9);
    assert_eq!(hours[0]["hour"], 9);
    assert_eq!(hours[1]["hour"], 10);
    assert_eq!(hours[1]["count"], 1);
    assert_eq!(hours[1]["available"], false);
    assert_eq!(hours[2]["available"], true);
}

#[tokio::test]
#[ignore]
async fn billing_applies_discount_before_tax() {
    let app = TestApp::spawn().await;
    let item = app.create_item("12.50", 10).await;

    let discount: Value = app
        .post("/discount-types")
        .json(&json!({ "name": "Loyalty", "value": "10", "is_percentage": true }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    let tax: Value = app
        .post("/tax-types")
        .json(&json!({ "name": "VAT", "value": "19", "is_percentage": true }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let response = app
        .post("/billing/total")
        .json(&json!({
            "items": [{ "id": item, "amount": 2 }],
            "discounts": [discount["id"]],
            "taxes": [tax["id"]]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let totals: Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(dec(&totals["subtotal"]), "25.00".parse::<Decimal>().unwrap());
    assert_eq!(dec(&totals["discount"]), "2.50".parse::<Decimal>().unwrap());
    assert_eq!(dec(&totals["tax"]), "4.28".parse::<Decimal>().unwrap());
    assert_eq!(dec(&totals["total"]), "26.78".parse::<Decimal>().unwrap());
}

#[tokio::test]
#[ignore]
async fn paying_an_order_issues_invoice_and_consumes_stock() {
    let app = TestApp::spawn().await;
    let customer = app.create_customer().await;
    let item = app.create_item("8.00", 5).await;

    let response = app
        .post("/purchase-orders")
        .json(&json!({ "items": [{ "id": item, "amount": 3 }], "customer_id": customer }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let order: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(order["order_state_id"], 1);
    assert_eq!(dec(&order["subtotal"]), "24.00".parse::<Decimal>().unwrap());

    let response = app
        .patch(&format!("/purchase-orders/{}/state", order["id"]))
        .json(&json!({ "order_state_id": 2 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let change: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(change["purchase_order"]["order_state_id"], 2);
    assert_eq!(change["invoice"]["purchase_order_id"], order["id"]);
    assert_eq!(change["invoice"]["enterprise_data"], "Back Office S.A.S.");

    let stock: Value = app
        .get(&format!("/item/{}/stock?quantity=3", item))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(stock["stock"], 2);
    assert_eq!(stock["available"], false);

    // Paid is terminal.
    let response = app
        .patch(&format!("/purchase-orders/{}/state", order["id"]))
        .json(&json!({ "order_state_id": 3 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    // Paid orders can no longer be edited.
    let response = app
        .put(&format!("/purchase-orders/{}", order["id"]))
        .json(&json!({ "items": [{ "id": item, "amount": 1 }] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore]
async fn paying_without_enough_stock_leaves_order_pending() {
    let app = TestApp::spawn().await;
    let customer = app.create_customer().await;
    let item = app.create_item("3.00", 1).await;

    let order: Value = app
        .post("/purchase-orders")
        .json(&json!({ "items": [{ "id": item, "amount": 2 }], "customer_id": customer }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let response = app
        .patch(&format!("/purchase-orders/{}/state", order["id"]))
        .json(&json!({ "order_state_id": 2 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    let current: Value = app
        .get(&format!("/purchase-orders/{}", order["id"]))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(current["order_state_id"], 1);
}

#[tokio::test]
#[ignore]
async fn price_changes_are_recorded_in_history() {
    let app = TestApp::spawn().await;
    let item = app.create_item("5.00", 1).await;

    let response = app
        .put(&format!("/item/{}", item))
        .json(&json!({
            "name": "Repriced item",
            "description": "Test item",
            "stock": 1,
            "selling_price": "6.50",
            "purchase_price": "1.00",
            "item_state": true,
            "item_type_id": 1
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let history: Vec<Value> = app
        .get(&format!("/historical-item-prices/{}", item))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    let prices: Vec<Decimal> = history.iter().map(|h| dec(&h["price"])).collect();
    assert_eq!(
        prices.last().copied(),
        Some("6.50".parse::<Decimal>().unwrap())
    );
}

#[tokio::test]
#[ignore]
async fn paying_requires_a_customer_and_paid_is_terminal() {
    let app = TestApp::spawn().await;
    let customer = app.create_customer().await;
    let item = app.create_item("2.00", 10).await;

    let anonymous: Value = app
        .post("/purchase-orders")
        .json(&json!({ "items": [{ "id": item, "amount": 1 }] }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let response = app
        .patch(&format!("/purchase-orders/{}/state", anonymous["id"]))
        .json(&json!({ "order_state_id": 2 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    let order: Value = app
        .post("/purchase-orders")
        .json(&json!({ "items": [{ "id": item, "amount": 1 }], "customer_id": customer }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    let state_uri = format!("/purchase-orders/{}/state", order["id"]);

    let response = app
        .patch(&state_uri)
        .json(&json!({ "order_state_id": 2 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    for target in [2, 3] {
        let response = app
            .patch(&state_uri)
            .json(&json!({ "order_state_id": target }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["error"], "Invalid state transition");
    }
}

#[tokio::test]
#[ignore]
async fn direct_invoice_consumes_stock() {
    let app = TestApp::spawn().await;
    let customer = app.create_customer().await;
    let item = app.create_item("4.00", 3).await;

    let response = app
        .post("/invoices")
        .json(&json!({ "customer_id": customer, "items": [{ "id": item, "amount": 2 }] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let invoice: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(dec(&invoice["total"]), "8.00".parse::<Decimal>().unwrap());

    // One unit left, two requested.
    let response = app
        .post("/invoices")
        .json(&json!({ "customer_id": customer, "items": [{ "id": item, "amount": 2 }] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    let stock: Value = app
        .get(&format!("/item/{}/stock?quantity=1", item))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(stock["stock"], 1);
}

#[tokio::test]
#[ignore]
async fn duplicate_customer_identifiers_conflict() {
    let app = TestApp::spawn().await;
    let existing = app.create_customer().await;

    let current: Value = app
        .get(&format!("/customers/{}", existing))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    let tag = uuid::Uuid::new_v4().simple().to_string();

    let customer = |customer_id: &Value, email: Value| {
        json!({
            "name": "Luis",
            "last_name": "Perez",
            "customer_id": customer_id,
            "identifier_type_id": 1,
            "email": email,
            "phone_number": "3007654321",
            "address": "Carrera 4 # 5-6",
            "customer_state": true
        })
    };

    let same_personal_id = customer(
        &current["customer_id"],
        json!(format!("luis.{}@shop.test", &tag[..10])),
    );
    let response = app
        .post("/customers")
        .json(&same_personal_id)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    let same_email = customer(&json!(format!("CC{}", &tag[..10])), current["email"].clone());
    let response = app
        .post("/customers")
        .json(&same_email)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
#[ignore]
async fn updating_a_missing_order_reports_the_order() {
    let app = TestApp::spawn().await;

    let response = app
        .put("/purchase-orders/2147483647")
        .json(&json!({ "items": [{ "id": 2147483647, "amount": 1 }] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Purchase order 2147483647 not found");
}
