//! Domain types for the storefront.
//!
//! These are validated domain objects, separate from database row types;
//! the repository layer converts rows into them and reports corrupt data
//! instead of panicking.

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderDraft, OrderItem, OrderLine, PaymentInfo, ShippingInfo};
pub use product::{PhotoRef, Product, ProductDraft, Review};
pub use user::{CurrentUser, User, session_keys};
