//! Order repository: order lifecycle and stock maintenance.
//!
//! Stock is adjusted exactly once per order, on the transition out of
//! `placed`, with a conditional decrement per line item
//! (`stock = stock - qty WHERE stock >= qty`) so concurrent confirmations
//! cannot oversell. All line items adjust inside one transaction: if any
//! decrement fails, the whole confirmation rolls back and no stock
//! changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use loomline_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderDraft, OrderItem};
use crate::models::{PaymentInfo, ShippingInfo};

const ORDER_COLUMNS: &str = "id, user_id, shipping_address, shipping_city, shipping_state, \
     shipping_country, shipping_postal_code, shipping_phone, payment_id, payment_status, \
     items_subtotal, tax_amount, shipping_amount, total_amount, status, created_at";

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    shipping_address: String,
    shipping_city: String,
    shipping_state: String,
    shipping_country: String,
    shipping_postal_code: String,
    shipping_phone: String,
    payment_id: String,
    payment_status: String,
    items_subtotal: Decimal,
    tax_amount: Decimal,
    shipping_amount: Decimal,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ItemRow {
    order_id: i64,
    product_id: i64,
    name: String,
    price: Decimal,
    quantity: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            shipping_info: ShippingInfo {
                address: self.shipping_address,
                city: self.shipping_city,
                state: self.shipping_state,
                country: self.shipping_country,
                postal_code: self.shipping_postal_code,
                phone_no: self.shipping_phone,
            },
            payment_info: PaymentInfo {
                id: self.payment_id,
                status: self.payment_status,
            },
            items,
            items_subtotal: self.items_subtotal,
            tax_amount: self.tax_amount,
            shipping_amount: self.shipping_amount,
            total_amount: self.total_amount,
            status,
            created_at: self.created_at,
        })
    }
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order for a user.
    ///
    /// Line items snapshot the product name and current price; the
    /// subtotal and grand total are computed here, never taken from the
    /// client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a line item references a
    /// missing product.
    pub async fn create(&self, user: UserId, draft: &OrderDraft) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut items = Vec::with_capacity(draft.items.len());
        let mut subtotal = Decimal::ZERO;

        for line in &draft.items {
            let product: Option<(String, Decimal)> =
                sqlx::query_as("SELECT name, price FROM product WHERE id = $1")
                    .bind(line.product)
                    .fetch_optional(&mut *tx)
                    .await?;

            let (name, price) = product.ok_or(RepositoryError::NotFound)?;
            subtotal += price * Decimal::from(line.quantity);
            items.push(OrderItem {
                product_id: line.product,
                name,
                price,
                quantity: line.quantity,
            });
        }

        let total = subtotal + draft.tax_amount + draft.shipping_amount;

        let row: OrderRow = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO store_order \
             (user_id, shipping_address, shipping_city, shipping_state, shipping_country, \
              shipping_postal_code, shipping_phone, payment_id, payment_status, \
              items_subtotal, tax_amount, shipping_amount, total_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user)
        .bind(&draft.shipping_info.address)
        .bind(&draft.shipping_info.city)
        .bind(&draft.shipping_info.state)
        .bind(&draft.shipping_info.country)
        .bind(&draft.shipping_info.postal_code)
        .bind(&draft.shipping_info.phone_no)
        .bind(&draft.payment_info.id)
        .bind(&draft.payment_info.status)
        .bind(subtotal)
        .bind(draft.tax_amount)
        .bind(draft.shipping_amount)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO store_order_item (order_id, product_id, name, price, quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.into_order(items)
    }

    /// Get an order by id, with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn find(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;

        let items: Vec<ItemRow> = sqlx::query_as::<_, ItemRow>(
            "SELECT order_id, product_id, name, price, quantity \
             FROM store_order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        row.into_order(items.into_iter().map(OrderItem::from).collect())
    }

    /// All orders placed by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store_order WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// All orders in the store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store_order ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Advance an order's status.
    ///
    /// Transitions are forward-only and `delivered` is terminal. The first
    /// transition out of `placed` is the confirmation: it applies every
    /// line item's stock decrement, all-or-nothing.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` - no such order, or a line item's
    ///   product no longer exists.
    /// - `RepositoryError::Conflict` - the order is already delivered.
    /// - `RepositoryError::Invalid` - a backwards transition, or a line
    ///   item would drive stock negative.
    pub async fn advance_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM store_order WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = status.ok_or(RepositoryError::NotFound)?;
        let current = status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        if current.is_terminal() {
            return Err(RepositoryError::Conflict(
                "order is already marked as delivered".to_owned(),
            ));
        }
        if !current.can_advance_to(next) {
            return Err(RepositoryError::Invalid(format!(
                "order status cannot move from {current} to {next}"
            )));
        }

        if current == OrderStatus::Placed {
            apply_stock(&mut tx, id).await?;
        }

        sqlx::query("UPDATE store_order SET status = $1 WHERE id = $2")
            .bind(next.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.find(id).await
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Attach line items to a page of order rows with a single query.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let item_rows: Vec<ItemRow> = sqlx::query_as::<_, ItemRow>(
            "SELECT order_id, product_id, name, price, quantity \
             FROM store_order_item WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItem::from(row));
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

/// Decrement stock for every line item of the order, conditionally.
///
/// Runs inside the confirmation transaction: the first failing line aborts
/// it, so earlier decrements never stick.
async fn apply_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    let items: Vec<(i64, i32)> =
        sqlx::query_as("SELECT product_id, quantity FROM store_order_item WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;

    for (product_id, quantity) in items {
        let updated =
            sqlx::query("UPDATE product SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
                .bind(quantity)
                .bind(product_id)
                .execute(&mut **tx)
                .await?;

        if updated.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE id = $1)")
                    .bind(product_id)
                    .fetch_one(&mut **tx)
                    .await?;

            return Err(if exists {
                RepositoryError::Invalid(format!(
                    "insufficient stock for product {product_id}"
                ))
            } else {
                RepositoryError::NotFound
            });
        }
    }

    Ok(())
}
