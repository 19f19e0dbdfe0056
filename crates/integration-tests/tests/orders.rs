//! Integration tests for orders, stock application, and the status
//! machine.
//!
//! Run with: `cargo test -p loomline-integration-tests -- --ignored`
//! (requires a running server and a seeded admin; see the crate docs)

use loomline_integration_tests::{base_url, client, login_as_admin, sign_up, unique_email};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn create_product_with_stock(admin: &Client, name: &str, stock: i32) -> i64 {
    let resp = admin
        .post(format!("{}/api/v1/admin/product/add", base_url()))
        .json(&json!({
            "name": name,
            "price": "30.00",
            "description": "integration test product",
            "category": "hoodies",
            "stock": stock,
            "brand": "Testline",
            "photos": ["https://images.example.com/source.jpg"],
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert!(resp.status().is_success());

    let body: Value = resp.json().await.expect("Failed to parse product");
    body["product"]["id"].as_i64().expect("product id")
}

async fn current_stock(product_id: i64) -> i64 {
    let resp = client()
        .get(format!("{}/api/v1/product/{product_id}", base_url()))
        .send()
        .await
        .expect("Failed to get product");
    let body: Value = resp.json().await.expect("Failed to parse product");
    body["product"]["stock"].as_i64().expect("stock")
}

async fn place_order(buyer: &Client, lines: &[(i64, i32)]) -> i64 {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product, quantity)| json!({ "product": product, "quantity": quantity }))
        .collect();

    let resp = buyer
        .post(format!("{}/api/v1/order/create", base_url()))
        .json(&json!({
            "shipping_info": {
                "address": "1 Test Way",
                "city": "Testville",
                "state": "TS",
                "country": "Testland",
                "postal_code": "00000",
                "phone_no": "555-0100",
            },
            "order_items": items,
            "payment_info": { "id": "pi_test", "status": "succeeded" },
            "tax_amount": "2.00",
            "shipping_amount": "5.00",
        }))
        .send()
        .await
        .expect("Failed to place order");
    assert!(resp.status().is_success(), "order failed: {}", resp.status());

    let body: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(body["order"]["status"], "placed");
    body["order"]["id"].as_i64().expect("order id")
}

async fn advance(admin: &Client, order_id: i64, status: &str) -> reqwest::Response {
    admin
        .put(format!("{}/api/v1/admin/order/{order_id}", base_url()))
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to advance order")
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn totals_are_computed_server_side() {
    let admin = client();
    login_as_admin(&admin).await;
    let product = create_product_with_stock(&admin, "Totals Hoodie", 10).await;

    let buyer = client();
    sign_up(&buyer, &unique_email(), "a-strong-password").await;
    let order_id = place_order(&buyer, &[(product, 2)]).await;

    let resp = buyer
        .get(format!("{}/api/v1/order/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to get order");
    let body: Value = resp.json().await.expect("Failed to parse order");

    // 2 x 30.00 + 2.00 tax + 5.00 shipping
    assert_eq!(body["order"]["items_subtotal"], "60.00");
    assert_eq!(body["order"]["total_amount"], "67.00");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn confirmation_applies_stock_exactly_once() {
    let admin = client();
    login_as_admin(&admin).await;
    let product = create_product_with_stock(&admin, "Stock Hoodie", 10).await;

    let buyer = client();
    sign_up(&buyer, &unique_email(), "a-strong-password").await;
    let order_id = place_order(&buyer, &[(product, 3)]).await;

    // Placing alone must not touch stock.
    assert_eq!(current_stock(product).await, 10);

    // Confirmation decrements.
    let resp = advance(&admin, order_id, "processing").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(current_stock(product).await, 7);

    // Later transitions never re-trigger the decrement.
    let resp = advance(&admin, order_id, "shipped").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = advance(&admin, order_id, "delivered").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(current_stock(product).await, 7);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn underflow_fails_and_leaves_all_stock_unchanged() {
    let admin = client();
    login_as_admin(&admin).await;
    let plenty = create_product_with_stock(&admin, "Plenty Hoodie", 50).await;
    let scarce = create_product_with_stock(&admin, "Scarce Hoodie", 1).await;

    let buyer = client();
    sign_up(&buyer, &unique_email(), "a-strong-password").await;
    let order_id = place_order(&buyer, &[(plenty, 5), (scarce, 2)]).await;

    // The scarce line underflows, so the whole confirmation fails...
    let resp = advance(&admin, order_id, "processing").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // ...and no line item's stock changed, including the one that fit.
    assert_eq!(current_stock(plenty).await, 50);
    assert_eq!(current_stock(scarce).await, 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn status_only_moves_forward_and_delivered_is_terminal() {
    let admin = client();
    login_as_admin(&admin).await;
    let product = create_product_with_stock(&admin, "Status Hoodie", 10).await;

    let buyer = client();
    sign_up(&buyer, &unique_email(), "a-strong-password").await;
    let order_id = place_order(&buyer, &[(product, 1)]).await;

    let resp = advance(&admin, order_id, "shipped").await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Backwards is a validation error.
    let resp = advance(&admin, order_id, "processing").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = advance(&admin, order_id, "delivered").await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Terminal state rejects any further update.
    let resp = advance(&admin, order_id, "delivered").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn orders_are_hidden_from_other_users() {
    let admin = client();
    login_as_admin(&admin).await;
    let product = create_product_with_stock(&admin, "Private Hoodie", 10).await;

    let buyer = client();
    sign_up(&buyer, &unique_email(), "a-strong-password").await;
    let order_id = place_order(&buyer, &[(product, 1)]).await;

    let stranger = client();
    sign_up(&stranger, &unique_email(), "a-strong-password").await;
    let resp = stranger
        .get(format!("{}/api/v1/order/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The owner still sees it in their own list.
    let resp = buyer
        .get(format!("{}/api/v1/myorder", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    let body: Value = resp.json().await.expect("Failed to parse orders");
    let orders = body["orders"].as_array().expect("orders array");
    assert!(orders.iter().any(|o| o["id"].as_i64() == Some(order_id)));
}
