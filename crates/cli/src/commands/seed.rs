//! Seed command: an admin account plus a small sample catalog.
//!
//! # Usage
//!
//! ```bash
//! loomline-cli seed -e admin@loomline.dev -p 'a-strong-password'
//! ```
//!
//! Re-running is safe: the admin account is upserted and sample products
//! are only inserted into an empty catalog.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use loomline_core::{Category, Email};

use super::{CommandError, database_url};

/// Sample products inserted into an empty catalog.
const SAMPLE_PRODUCTS: [(&str, Decimal, &str, Category, i32, &str); 4] = [
    (
        "Classic Crew Tee",
        Decimal::from_parts(2499, 0, 0, false, 2),
        "Everyday short-sleeve tee in heavyweight cotton.",
        Category::Shortsleeves,
        120,
        "Loomline",
    ),
    (
        "Breton Longsleeve",
        Decimal::from_parts(3299, 0, 0, false, 2),
        "Striped long-sleeve shirt with a relaxed fit.",
        Category::Longsleeves,
        80,
        "Loomline",
    ),
    (
        "Harbor Sweatshirt",
        Decimal::from_parts(5499, 0, 0, false, 2),
        "Brushed-fleece crewneck sweatshirt.",
        Category::Sweatshirts,
        45,
        "Harborline",
    ),
    (
        "Summit Hoodie",
        Decimal::from_parts(6899, 0, 0, false, 2),
        "Midweight zip hoodie with lined hood.",
        Category::Hoodies,
        30,
        "Summit Supply",
    ),
];

/// Seed the database.
///
/// # Errors
///
/// Returns `CommandError` if the input is invalid or a statement fails.
pub async fn run(email: &str, password: &str) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    if password.len() < 8 {
        return Err(CommandError::InvalidInput(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CommandError::Hash(e.to_string()))?
        .to_string();

    let pool = PgPool::connect(&database_url()?).await?;

    tracing::info!("Seeding admin account {}...", email);
    let admin_id: i64 = sqlx::query_scalar(
        "INSERT INTO store_user (name, email, password_hash, role) \
         VALUES ('Store Admin', $1, $2, 'admin') \
         ON CONFLICT (email) \
         DO UPDATE SET password_hash = EXCLUDED.password_hash, role = 'admin' \
         RETURNING id",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .fetch_one(&pool)
    .await?;

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
        .fetch_one(&pool)
        .await?;

    if product_count > 0 {
        tracing::info!("Catalog already has {product_count} products, skipping samples");
        return Ok(());
    }

    for (name, price, description, category, stock, brand) in SAMPLE_PRODUCTS {
        sqlx::query(
            "INSERT INTO product (name, price, description, category, stock, brand, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(name)
        .bind(price)
        .bind(description)
        .bind(category.as_str())
        .bind(stock)
        .bind(brand)
        .bind(admin_id)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeded {} sample products", SAMPLE_PRODUCTS.len());
    Ok(())
}
