//! Home route handler.

use axum::Json;
use serde::Serialize;

/// Greeting payload for the API root.
#[derive(Serialize)]
pub struct HomeResponse {
    pub success: bool,
    pub greeting: &'static str,
}

/// API root greeting.
pub async fn index() -> Json<HomeResponse> {
    Json(HomeResponse {
        success: true,
        greeting: "Welcome to the Loomline API",
    })
}
