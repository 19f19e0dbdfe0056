//! Payment route handlers.
//!
//! The gateway is an external collaborator: these handlers pass amounts in
//! and hand the resolved intent back out. Gateway failures surface as
//! upstream errors at the client boundary.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Intent creation body: the amount in the currency's minor unit.
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub amount: i64,
}

/// The browser-safe gateway key.
#[derive(Serialize)]
pub struct PaymentKeyResponse {
    pub success: bool,
    pub publishable_key: String,
}

/// A created intent, ready for client-side confirmation.
#[derive(Serialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub amount: i64,
    pub client_secret: String,
    pub intent_id: String,
}

/// The publishable key for the payment form.
pub async fn publishable_key(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
) -> Result<Json<PaymentKeyResponse>> {
    Ok(Json(PaymentKeyResponse {
        success: true,
        publishable_key: state.payments().publishable_key().to_owned(),
    }))
}

/// Create a payment intent for checkout.
pub async fn create_intent(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Json(body): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>> {
    if body.amount <= 0 {
        return Err(AppError::Validation(
            "amount must be a positive number of minor units".to_owned(),
        ));
    }

    let intent = state.payments().create_intent(body.amount).await?;

    Ok(Json(CaptureResponse {
        success: true,
        amount: intent.amount,
        client_secret: intent.client_secret,
        intent_id: intent.id,
    }))
}
