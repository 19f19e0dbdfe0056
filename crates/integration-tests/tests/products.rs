//! Integration tests for the catalog query surface and review aggregates.
//!
//! Run with: `cargo test -p loomline-integration-tests -- --ignored`
//! (requires a running server and a seeded admin; see the crate docs)

use loomline_integration_tests::{base_url, client, login_as_admin, sign_up, unique_email};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Create a product through the admin API and return its id.
async fn create_product(admin: &Client, name: &str, price: &str, category: &str) -> i64 {
    let resp = admin
        .post(format!("{}/api/v1/admin/product/add", base_url()))
        .json(&json!({
            "name": name,
            "price": price,
            "description": "integration test product",
            "category": category,
            "stock": 50,
            "brand": "Testline",
            "photos": ["https://images.example.com/source.jpg"],
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert!(
        resp.status().is_success(),
        "product create failed: {}",
        resp.status()
    );

    let body: Value = resp.json().await.expect("Failed to parse product");
    body["product"]["id"].as_i64().expect("product id")
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn filters_compose_as_logical_and() {
    let admin = client();
    login_as_admin(&admin).await;

    let marker = unique_email();
    create_product(&admin, &format!("cheap {marker}"), "10.00", "hoodies").await;
    create_product(&admin, &format!("mid {marker}"), "250.00", "hoodies").await;
    create_product(&admin, &format!("rich {marker}"), "900.00", "shortsleeves").await;

    let resp = client()
        .get(format!(
            "{}/api/v1/products?search={marker}&category=hoodies&price[gte]=199",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse listing");
    let products = body["products"].as_array().expect("products array");
    assert_eq!(products.len(), 1, "only the mid hoodie matches all stages");
    assert_eq!(body["filtered_products"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn operator_words_inside_values_are_plain_text() {
    let admin = client();
    login_as_admin(&admin).await;

    let brand = format!("voltage-gte-{}", unique_email());
    let resp = admin
        .post(format!("{}/api/v1/admin/product/add", base_url()))
        .json(&json!({
            "name": "Operator Brand Tee",
            "price": "20.00",
            "description": "brand name contains an operator word",
            "category": "shortsleeves",
            "stock": 5,
            "brand": brand,
            "photos": ["https://images.example.com/source.jpg"],
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert!(resp.status().is_success());

    // Filtering on that exact brand must round-trip the value verbatim.
    let resp = client()
        .get(format!("{}/api/v1/products?brand={brand}", base_url()))
        .send()
        .await
        .expect("Failed to list products");
    let body: Value = resp.json().await.expect("Failed to parse listing");
    assert_eq!(body["filtered_products"], 1);
    assert_eq!(body["products"][0]["brand"], brand.as_str());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn malformed_operator_operand_is_a_validation_error() {
    let resp = client()
        .get(format!("{}/api/v1/products?price[gte]=cheap", base_url()))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn pagination_defaults_and_clamps() {
    for query in ["page=notanumber", "page=0", ""] {
        let resp = client()
            .get(format!("{}/api/v1/products?{query}", base_url()))
            .send()
            .await
            .expect("Failed to list products");
        assert_eq!(resp.status(), StatusCode::OK, "query {query}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn resubmitted_review_replaces_in_place() {
    let admin = client();
    login_as_admin(&admin).await;
    let product_id = create_product(&admin, "Review Target Tee", "20.00", "shortsleeves").await;

    let reviewer = client();
    sign_up(&reviewer, &unique_email(), "a-strong-password").await;

    let first = reviewer
        .put(format!("{}/api/v1/review", base_url()))
        .json(&json!({ "productId": product_id, "rating": 2, "comment": "meh" }))
        .send()
        .await
        .expect("Failed to submit review");
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = first.json().await.expect("Failed to parse summary");
    assert_eq!(body["number_of_reviews"], 1);
    assert_eq!(body["ratings"], "2.00");

    // Same reviewer again: replaced, not appended.
    let second = reviewer
        .put(format!("{}/api/v1/review", base_url()))
        .json(&json!({ "productId": product_id, "rating": 4, "comment": "grew on me" }))
        .send()
        .await
        .expect("Failed to resubmit review");
    let body: Value = second.json().await.expect("Failed to parse summary");
    assert_eq!(body["number_of_reviews"], 1);
    assert_eq!(body["ratings"], "4.00");

    // Only the newest comment is observable.
    let resp = client()
        .get(format!("{}/api/v1/reviews?id={product_id}", base_url()))
        .send()
        .await
        .expect("Failed to list reviews");
    let body: Value = resp.json().await.expect("Failed to parse reviews");
    let reviews = body["reviews"].as_array().expect("reviews array");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["comment"], "grew on me");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn two_reviewers_average_exactly() {
    let admin = client();
    login_as_admin(&admin).await;
    let product_id = create_product(&admin, "Average Tee", "20.00", "shortsleeves").await;

    for (rating, comment) in [(4, "good"), (2, "rough")] {
        let reviewer = client();
        sign_up(&reviewer, &unique_email(), "a-strong-password").await;
        let resp = reviewer
            .put(format!("{}/api/v1/review", base_url()))
            .json(&json!({ "productId": product_id, "rating": rating, "comment": comment }))
            .send()
            .await
            .expect("Failed to submit review");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client()
        .get(format!("{}/api/v1/product/{product_id}", base_url()))
        .send()
        .await
        .expect("Failed to get product");
    let body: Value = resp.json().await.expect("Failed to parse product");
    assert_eq!(body["product"]["number_of_reviews"], 2);
    // ratings 4 and 2 -> mean 3.00 exactly
    assert_eq!(body["product"]["ratings"], "3.00");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded admin"]
async fn deleting_the_only_review_zeroes_the_aggregates() {
    let admin = client();
    login_as_admin(&admin).await;
    let product_id = create_product(&admin, "Lonely Review Tee", "20.00", "shortsleeves").await;

    let reviewer = client();
    sign_up(&reviewer, &unique_email(), "a-strong-password").await;
    reviewer
        .put(format!("{}/api/v1/review", base_url()))
        .json(&json!({ "productId": product_id, "rating": 5, "comment": "the only one" }))
        .send()
        .await
        .expect("Failed to submit review");

    let resp = reviewer
        .delete(format!(
            "{}/api/v1/review?productId={product_id}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to delete review");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse summary");
    assert_eq!(body["number_of_reviews"], 0);
    assert_eq!(body["ratings"], "0");
}
