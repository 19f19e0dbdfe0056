//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - API greeting
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (DB ping)
//!
//! # Accounts (/api/v1)
//! POST /signup                          - Register (optional avatar)
//! POST /login                           - Login
//! GET  /logout                          - Logout
//! POST /forgotpassword                  - Email a reset link
//! POST /password/reset/{token}          - Reset password via emailed token
//! GET  /userdashboard                   - Own account details (auth)
//! POST /password/update                 - Change own password (auth)
//! POST /userdashboard/update            - Update own profile (auth)
//!
//! # Catalog (/api/v1)
//! GET  /products                        - Search/filter/paginate catalog
//! GET  /product/{id}                    - Product detail with reviews
//! PUT  /review                          - Submit or replace own review (auth)
//! DELETE /review?productId=…            - Delete own review (auth)
//! GET  /reviews?id=…                    - Reviews for a product
//!
//! # Orders (/api/v1)
//! POST /order/create                    - Place an order (auth)
//! GET  /order/{id}                      - One order (owner or manager)
//! GET  /myorder                         - Own orders (auth)
//!
//! # Payments (/api/v1)
//! GET  /paymentkey                      - Publishable gateway key (auth)
//! POST /capturepayment                  - Create a payment intent (auth)
//!
//! # Admin / Manager (/api/v1, capability-gated)
//! GET  /admin/products                  - All products
//! POST /admin/product/add               - Add product
//! PUT|DELETE /admin/product/{id}        - Update / delete product
//! GET  /admin/orders                    - All orders
//! PUT|DELETE /admin/order/{id}          - Advance status / delete order
//! GET  /admin/users                     - All accounts
//! GET|PUT|DELETE /admin/user/{id}       - One account
//! GET  /manager/users                   - Read-only account list
//! ```

pub mod account;
pub mod auth;
pub mod home;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Build the application router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .nest("/api/v1", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/forgotpassword", post(auth::forgot_password))
        .route("/password/reset/{token}", post(auth::reset_password))
        .route("/userdashboard", get(account::dashboard))
        .route("/password/update", post(account::change_password))
        .route("/userdashboard/update", post(account::update_profile))
        // Catalog
        .route("/products", get(products::list))
        .route("/product/{id}", get(products::detail))
        .route(
            "/review",
            put(products::submit_review).delete(products::delete_review),
        )
        .route("/reviews", get(products::list_reviews))
        // Orders
        .route("/order/create", post(orders::create))
        .route("/order/{id}", get(orders::get_one))
        .route("/myorder", get(orders::mine))
        // Payments
        .route("/paymentkey", get(payments::publishable_key))
        .route("/capturepayment", post(payments::create_intent))
        // Admin catalog
        .route("/admin/products", get(products::admin_list))
        .route("/admin/product/add", post(products::admin_add))
        .route(
            "/admin/product/{id}",
            put(products::admin_update).delete(products::admin_delete),
        )
        // Admin orders
        .route("/admin/orders", get(orders::admin_list))
        .route(
            "/admin/order/{id}",
            put(orders::admin_update).delete(orders::admin_delete),
        )
        // Admin / manager users
        .route("/admin/users", get(users::admin_list))
        .route(
            "/admin/user/{id}",
            get(users::admin_get_one)
                .put(users::admin_update)
                .delete(users::admin_delete),
        )
        .route("/manager/users", get(users::manager_list))
}
