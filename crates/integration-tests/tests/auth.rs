//! Integration tests for account flows.
//!
//! Run with: `cargo test -p loomline-integration-tests -- --ignored`
//! (requires a running server; see the crate docs for setup)

use loomline_integration_tests::{base_url, client, sign_up, unique_email};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn signup_logs_the_user_in() {
    let client = client();
    let email = unique_email();

    let body = sign_up(&client, &email, "a-strong-password").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["role"], "user");

    // The session cookie from signup should open the dashboard.
    let resp = client
        .get(format!("{}/api/v1/userdashboard", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    let dashboard: Value = resp.json().await.expect("Failed to parse dashboard");
    assert_eq!(dashboard["user"]["email"], email.as_str());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn duplicate_signup_conflicts() {
    let client = client();
    let email = unique_email();

    sign_up(&client, &email, "a-strong-password").await;

    let resp = client
        .post(format!("{}/api/v1/signup", base_url()))
        .json(&json!({
            "name": "Someone Else",
            "email": email,
            "password": "another-password",
        }))
        .send()
        .await
        .expect("Failed to send signup");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn wrong_password_is_unauthorized() {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email, "a-strong-password").await;

    let resp = client
        .post(format!("{}/api/v1/login", base_url()))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn logout_ends_the_session() {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email, "a-strong-password").await;

    let resp = client
        .get(format!("{}/api/v1/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert!(resp.status().is_success());

    let resp = client
        .get(format!("{}/api/v1/userdashboard", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn password_change_requires_the_old_password() {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email, "a-strong-password").await;

    let resp = client
        .post(format!("{}/api/v1/password/update", base_url()))
        .json(&json!({
            "old_password": "wrong-old-password",
            "password": "a-new-password",
        }))
        .send()
        .await
        .expect("Failed to send password change");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{}/api/v1/password/update", base_url()))
        .json(&json!({
            "old_password": "a-strong-password",
            "password": "a-new-password",
        }))
        .send()
        .await
        .expect("Failed to send password change");
    assert_eq!(resp.status(), StatusCode::OK);

    // The new password logs in.
    let fresh = loomline_integration_tests::client();
    let resp = fresh
        .post(format!("{}/api/v1/login", base_url()))
        .json(&json!({ "email": email, "password": "a-new-password" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn management_routes_reject_regular_users() {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email, "a-strong-password").await;

    for path in ["/api/v1/admin/users", "/api/v1/manager/users", "/api/v1/admin/orders"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "path {path}");
    }
}
