//! DDL for the order store.

#![allow(missing_docs)]

use rusqlite::Connection;

use crate::core::errors::Result;

const ORDERS_SCHEMA: &str = include_str!("sql/orders_schema.sql");

/// Columns of the `orders` relation, in DDL order.
pub const ORDER_COLUMNS: &[&str] = &[
    "transaction_id",
    "order_date",
    "order_year",
    "order_month",
    "order_quarter",
    "customer_id",
    "customer_city",
    "customer_state",
    "customer_tier",
    "customer_age_group",
    "is_prime_member",
    "product_id",
    "product_name",
    "subcategory",
    "brand",
    "original_price_inr",
    "discount_percent",
    "discounted_price_inr",
    "quantity",
    "final_amount_inr",
    "delivery_days",
    "delivery_charges",
    "payment_method",
    "is_festival_sale",
    "festival_name",
    "customer_rating",
    "product_rating",
    "return_status",
];

/// Create the `orders` table and its indexes if absent.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(ORDERS_SCHEMA)?;
    Ok(())
}

/// Number of rows currently stored.
pub fn order_count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
    Ok(u64::try_from(n).unwrap_or(0))
}
