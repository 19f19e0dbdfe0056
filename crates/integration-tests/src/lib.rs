//! Shared helpers for the Loomline integration tests.
//!
//! These tests exercise a running storefront over HTTP. They require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (`cargo run -p loomline-storefront`)
//! - An admin account (`cargo run -p loomline-cli -- seed -p …`)
//!
//! Configure via environment:
//! - `STORE_BASE_URL` (default: `http://localhost:4000`)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` for the seeded admin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STORE_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// A fresh client with a cookie store, so login sessions persist across
/// requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique throwaway email for account tests.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Sign up a fresh user on the given client and return the response body.
///
/// # Panics
///
/// Panics when the request cannot be sent or returns a non-success status.
pub async fn sign_up(client: &Client, email: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{}/api/v1/signup", base_url()))
        .json(&json!({
            "name": "Integration Tester",
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to sign up");

    assert!(
        resp.status().is_success(),
        "signup failed: {}",
        resp.status()
    );
    resp.json().await.expect("Failed to parse signup response")
}

/// Log a client in as the seeded admin account.
///
/// # Panics
///
/// Panics when `ADMIN_EMAIL`/`ADMIN_PASSWORD` are unset or login fails.
pub async fn login_as_admin(client: &Client) {
    let email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL not set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD not set");

    let resp = client
        .post(format!("{}/api/v1/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in as admin");

    assert!(
        resp.status().is_success(),
        "admin login failed: {}",
        resp.status()
    );
}
