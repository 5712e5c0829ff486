//! Order records and deterministic synthetic data for demos and tests.

#![allow(missing_docs)]

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, params};

use crate::core::errors::Result;

/// One order line as stored in `orders`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub transaction_id: String,
    pub order_date: NaiveDate,
    pub customer_id: String,
    pub customer_city: String,
    pub customer_state: String,
    pub customer_tier: String,
    pub customer_age_group: String,
    pub is_prime_member: bool,
    pub product_id: String,
    pub product_name: String,
    pub subcategory: String,
    pub brand: String,
    pub original_price_inr: f64,
    pub discount_percent: f64,
    pub quantity: i64,
    pub final_amount_inr: f64,
    pub delivery_days: Option<i64>,
    pub delivery_charges: f64,
    pub payment_method: String,
    pub is_festival_sale: bool,
    pub festival_name: Option<String>,
    pub customer_rating: Option<f64>,
    pub product_rating: Option<f64>,
    pub return_status: String,
}

impl OrderRecord {
    /// Minimal delivered order; other fields take neutral values.
    #[must_use]
    pub fn new(transaction_id: &str, customer_id: &str, order_date: NaiveDate, final_amount_inr: f64) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            order_date,
            customer_id: customer_id.to_string(),
            customer_city: "Mumbai".to_string(),
            customer_state: "Maharashtra".to_string(),
            customer_tier: "Metro".to_string(),
            customer_age_group: "26-35".to_string(),
            is_prime_member: false,
            product_id: "P0001".to_string(),
            product_name: "Wireless Earbuds".to_string(),
            subcategory: "Audio".to_string(),
            brand: "boAt".to_string(),
            original_price_inr: final_amount_inr,
            discount_percent: 0.0,
            quantity: 1,
            final_amount_inr,
            delivery_days: Some(3),
            delivery_charges: 0.0,
            payment_method: "UPI".to_string(),
            is_festival_sale: false,
            festival_name: None,
            customer_rating: Some(4.0),
            product_rating: Some(4.0),
            return_status: "Delivered".to_string(),
        }
    }

    #[must_use]
    pub fn discounted_price_inr(&self) -> f64 {
        self.original_price_inr * (1.0 - self.discount_percent / 100.0)
    }
}

/// Insert records in one transaction. Returns the number inserted.
pub fn insert_orders(conn: &mut Connection, orders: &[OrderRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO orders (
                transaction_id, order_date, order_year, order_month, order_quarter,
                customer_id, customer_city, customer_state, customer_tier, customer_age_group,
                is_prime_member, product_id, product_name, subcategory, brand,
                original_price_inr, discount_percent, discounted_price_inr, quantity,
                final_amount_inr, delivery_days, delivery_charges, payment_method,
                is_festival_sale, festival_name, customer_rating, product_rating, return_status
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,
                      ?21,?22,?23,?24,?25,?26,?27,?28)",
        )?;
        for o in orders {
            let month = o.order_date.month();
            stmt.execute(params![
                o.transaction_id,
                o.order_date.format("%Y-%m-%d").to_string(),
                o.order_date.year(),
                month,
                (month - 1) / 3 + 1,
                o.customer_id,
                o.customer_city,
                o.customer_state,
                o.customer_tier,
                o.customer_age_group,
                o.is_prime_member,
                o.product_id,
                o.product_name,
                o.subcategory,
                o.brand,
                o.original_price_inr,
                o.discount_percent,
                o.discounted_price_inr(),
                o.quantity,
                o.final_amount_inr,
                o.delivery_days,
                o.delivery_charges,
                o.payment_method,
                o.is_festival_sale,
                o.festival_name,
                o.customer_rating,
                o.product_rating,
                o.return_status,
            ])?;
        }
    }
    tx.commit()?;
    Ok(orders.len())
}

// ──────────────────── synthetic data ────────────────────

const CATALOG: &[(&str, &str, &str, f64)] = &[
    ("Wireless Earbuds", "Audio", "boAt", 1_999.0),
    ("Noise Cancelling Headphones", "Audio", "Sony", 24_990.0),
    ("Bluetooth Speaker", "Audio", "JBL", 4_499.0),
    ("Soundbar", "Audio", "Samsung", 14_999.0),
    ("Galaxy S Series", "Smartphones", "Samsung", 74_999.0),
    ("iPhone", "Smartphones", "Apple", 79_900.0),
    ("Redmi Note", "Smartphones", "Xiaomi", 16_999.0),
    ("OnePlus Nord", "Smartphones", "OnePlus", 27_999.0),
    ("MacBook Air", "Laptops", "Apple", 114_900.0),
    ("IdeaPad", "Laptops", "Lenovo", 54_990.0),
    ("Pavilion", "Laptops", "HP", 62_990.0),
    ("Vivobook", "Laptops", "Asus", 48_990.0),
    ("Smart Watch", "Wearables", "Noise", 2_999.0),
    ("Apple Watch", "Wearables", "Apple", 41_900.0),
    ("Fitness Band", "Wearables", "Xiaomi", 2_499.0),
    ("Smart TV 43in", "Televisions", "Samsung", 32_990.0),
    ("OLED TV 55in", "Televisions", "Sony", 139_990.0),
    ("Fire TV Stick", "Streaming", "Amazon", 4_999.0),
    ("Echo Dot", "Smart Home", "Amazon", 4_499.0),
    ("Kindle Paperwhite", "E-Readers", "Amazon", 13_999.0),
];

const CITIES: &[(&str, &str, &str)] = &[
    ("Mumbai", "Maharashtra", "Metro"),
    ("Pune", "Maharashtra", "Tier1"),
    ("Delhi", "Delhi", "Metro"),
    ("Bengaluru", "Karnataka", "Metro"),
    ("Mysuru", "Karnataka", "Tier2"),
    ("Chennai", "Tamil Nadu", "Metro"),
    ("Coimbatore", "Tamil Nadu", "Tier1"),
    ("Kolkata", "West Bengal", "Metro"),
    ("Jaipur", "Rajasthan", "Tier1"),
    ("Udaipur", "Rajasthan", "Tier2"),
    ("Lucknow", "Uttar Pradesh", "Tier1"),
    ("Varanasi", "Uttar Pradesh", "Rural"),
];

const AGE_GROUPS: &[&str] = &["18-25", "26-35", "36-45", "46-55", "55+"];
const PAYMENT_METHODS: &[&str] = &["UPI", "Credit Card", "Debit Card", "Cash on Delivery", "Net Banking", "Wallet"];
const FESTIVALS: &[(u32, &str)] = &[(10, "Diwali Sale"), (7, "Prime Day"), (1, "Republic Day Sale")];

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Deterministic pseudo-random orders spread over 2020-01-01 .. 2025-08-31.
#[must_use]
pub fn synthetic_orders(rows: usize, seed: u64) -> Vec<OrderRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let span_days: i64 = 2_069;
    let customers = (rows / 4).max(1);

    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let date = start + Duration::days(rng.random_range(0..=span_days));
        let (name, subcategory, brand, list_price) = *pick(&mut rng, CATALOG);
        let product_idx = CATALOG.iter().position(|p| p.0 == name).unwrap_or(0);
        let (city, state, tier) = *pick(&mut rng, CITIES);
        let customer = rng.random_range(0..customers);

        let festival = FESTIVALS
            .iter()
            .find(|(month, _)| *month == date.month())
            .filter(|_| rng.random_bool(0.6))
            .map(|(_, label)| (*label).to_string());
        let discount_percent = if festival.is_some() {
            f64::from(rng.random_range(10_u8..=60))
        } else {
            f64::from(rng.random_range(0_u8..=30))
        };
        let quantity: i64 = if rng.random_bool(0.85) { 1 } else { rng.random_range(2..=4) };
        let unit_price = list_price * (1.0 - discount_percent / 100.0);
        let delivery_charges = if unit_price >= 499.0 { 0.0 } else { 40.0 };
        let final_amount = (unit_price * quantity as f64 + delivery_charges).round();

        let roll: f64 = rng.random();
        let return_status = if roll < 0.06 {
            "Returned"
        } else if roll < 0.09 {
            "Cancelled"
        } else {
            "Delivered"
        };
        let rating = |rng: &mut StdRng| f64::from(rng.random_range(20_u8..=50)) / 10.0;

        out.push(OrderRecord {
            transaction_id: format!("TXN{i:08}"),
            order_date: date,
            customer_id: format!("CUST{customer:06}"),
            customer_city: city.to_string(),
            customer_state: state.to_string(),
            customer_tier: tier.to_string(),
            customer_age_group: (*pick(&mut rng, AGE_GROUPS)).to_string(),
            // membership is a property of the customer, not the order
            is_prime_member: customer % 3 == 0,
            product_id: format!("P{:04}", product_idx + 1),
            product_name: name.to_string(),
            subcategory: subcategory.to_string(),
            brand: brand.to_string(),
            original_price_inr: list_price,
            discount_percent,
            quantity,
            final_amount_inr: final_amount,
            delivery_days: Some(rng.random_range(1..=if tier == "Rural" { 12 } else { 8 })),
            delivery_charges,
            payment_method: (*pick(&mut rng, PAYMENT_METHODS)).to_string(),
            is_festival_sale: festival.is_some(),
            festival_name: festival,
            customer_rating: rng.random_bool(0.9).then(|| rating(&mut rng)),
            product_rating: rng.random_bool(0.8).then(|| rating(&mut rng)),
            return_status: return_status.to_string(),
        });
    }
    out
}

/// Generate and insert `rows` synthetic orders.
pub fn seed_orders(conn: &mut Connection, rows: usize, seed: u64) -> Result<usize> {
    insert_orders(conn, &synthetic_orders(rows, seed))
}
