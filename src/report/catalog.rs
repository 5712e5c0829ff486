//! Built-in report catalog, in menu order.
//!
//! Every query filters `order_year > :min_year`. Queries aggregate in SQL
//! where the database does it naturally; ratios, shares, growth, unit
//! scaling and top-N cuts happen in each report's pipeline.

#![allow(missing_docs)]

use crate::core::config::ReportsConfig;
use crate::core::errors::Result;
use crate::normalize::pipeline::{Aggregation, MetricSpec, Pipeline};
use crate::normalize::rules::{AggFunc, DisplayUnit};
use crate::report::definition::{ReportDefinition, ReportVariant};
use crate::report::params::ParameterSpec;
use crate::report::registry::ReportRegistry;

const CROSS_SELL_TOP: usize = 10;

/// Build and validate the full catalog.
pub fn builtin_registry(cfg: &ReportsConfig) -> Result<ReportRegistry> {
    let mut registry = ReportRegistry::new();
    for report in builtin_reports(cfg) {
        registry.register(report)?;
    }
    Ok(registry)
}

/// All built-in definitions with defaults taken from `cfg`.
#[must_use]
pub fn builtin_reports(cfg: &ReportsConfig) -> Vec<ReportDefinition> {
    vec![
        executive_summary(cfg),
        performance_monitor(cfg),
        strategic_overview(cfg),
        financial_performance(cfg),
        growth_analytics(cfg),
        revenue_trend(cfg),
        category_performance(cfg),
        geographic_revenue(cfg),
        festival_sales(cfg),
        price_optimization(cfg),
        customer_segmentation(cfg),
        customer_journey(cfg),
        prime_membership(cfg),
        customer_retention(cfg),
        demographics(cfg),
        product_performance(cfg),
        brand_analytics(cfg),
        inventory_optimization(cfg),
        product_ratings(cfg),
        product_launch(cfg),
        delivery_performance(cfg),
        payment_analytics(cfg),
        returns_cancellations(cfg),
        customer_service(cfg),
        supply_chain(cfg),
        predictive_analytics(cfg),
        market_intelligence(cfg),
        cross_selling(cfg),
        seasonal_planning(cfg),
        command_center(cfg),
    ]
}

fn min_year(cfg: &ReportsConfig) -> ParameterSpec {
    ParameterSpec::year("min_year", cfg.min_order_year)
}

fn late_days(cfg: &ReportsConfig) -> ParameterSpec {
    ParameterSpec::integer("late_days", cfg.late_delivery_days, 0, 365)
}

fn single(id: &str, title: &str, cfg: &ReportsConfig, sql: &str, pipeline: Pipeline) -> ReportDefinition {
    ReportDefinition::single(id, title, ReportVariant::new(sql, pipeline)).param(min_year(cfg))
}

fn views(
    id: &str,
    title: &str,
    cfg: &ReportsConfig,
    parameter: &str,
    variants: Vec<(&str, &str, Pipeline)>,
) -> ReportDefinition {
    ReportDefinition::with_views(
        id,
        title,
        parameter,
        variants
            .into_iter()
            .map(|(name, sql, pipeline)| (name, ReportVariant::new(sql, pipeline)))
            .collect(),
    )
    .param(min_year(cfg))
}

// ──────────────────── executive ────────────────────

fn executive_summary(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "executive-summary",
        "Executive Summary",
        cfg,
        "WITH yearly AS (
             SELECT order_year,
                    SUM(final_amount_inr) AS revenue,
                    COUNT(DISTINCT customer_id) AS active_customers,
                    COUNT(DISTINCT transaction_id) AS orders
             FROM orders
             WHERE order_year > :min_year
             GROUP BY order_year
         ),
         ranked AS (
             SELECT order_year,
                    subcategory,
                    SUM(final_amount_inr) AS subcategory_revenue,
                    ROW_NUMBER() OVER (
                        PARTITION BY order_year ORDER BY SUM(final_amount_inr) DESC, subcategory
                    ) AS rn
             FROM orders
             WHERE order_year > :min_year
             GROUP BY order_year, subcategory
         )
         SELECT y.order_year, y.revenue, y.active_customers, y.orders,
                r.subcategory AS top_subcategory, r.subcategory_revenue
         FROM yearly y
         JOIN ranked r ON r.order_year = y.order_year AND r.rn = 1
         ORDER BY y.order_year",
        Pipeline::columns(
            "order_year",
            &[
                ("revenue_crores", "revenue_crores"),
                ("yoy_growth_pct", "yoy_growth_pct"),
                ("active_customers", "active_customers"),
                ("avg_order_value", "avg_order_value"),
            ],
        )
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .growth("revenue", "yoy_growth_pct")
        .quotient("revenue", "orders", "avg_order_value")
        .metric(MetricSpec::last("Total Revenue (₹ Cr)", "revenue_crores").with_delta("yoy_growth_pct"))
        .metric(MetricSpec::last("Active Customers", "active_customers").precision(0))
        .metric(MetricSpec::last("Average Order Value (₹)", "avg_order_value"))
        .metric(MetricSpec::last_text("Top Subcategory", "top_subcategory"))
        .metric(MetricSpec::last("Top Subcategory Revenue (₹ Cr)", "subcategory_revenue").scaled(DisplayUnit::Crores)),
    )
}

fn performance_monitor(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "performance-monitor",
        "Business Performance Monitor",
        cfg,
        "SELECT printf('%d-%02d', order_year, order_month) AS period,
                order_year,
                SUM(final_amount_inr) AS revenue,
                COUNT(transaction_id) AS orders,
                COUNT(DISTINCT customer_id) AS active_customers,
                SUM(quantity) AS units,
                AVG(customer_rating) AS avg_rating
         FROM orders
         WHERE order_year > :min_year
         GROUP BY order_year, order_month
         ORDER BY order_year, order_month",
        Pipeline::columns("period", &[("revenue_crores", "revenue_crores"), ("orders", "orders")])
            .scale("revenue", DisplayUnit::Crores, "revenue_crores")
            .growth_within("revenue", "mom_growth_pct", "order_year")
            // a negative delta is the revenue-down alert
            .metric(MetricSpec::last("Revenue (₹ Cr)", "revenue_crores").with_delta("mom_growth_pct"))
            .metric(MetricSpec::last("Active Customers", "active_customers").precision(0))
            .metric(MetricSpec::last("Total Orders", "orders").precision(0))
            .metric(MetricSpec::last("Total Quantity", "units").precision(0))
            .metric(MetricSpec::last("Avg Customer Rating", "avg_rating").precision(1)),
    )
}

fn strategic_overview(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "strategic-overview",
        "Strategic Overview",
        cfg,
        "SELECT order_year,
                brand,
                SUM(final_amount_inr) AS revenue,
                SUM(SUM(final_amount_inr)) OVER (PARTITION BY order_year) AS year_revenue,
                COUNT(transaction_id) AS orders
         FROM orders
         WHERE order_year > :min_year
         GROUP BY order_year, brand
         ORDER BY order_year DESC, revenue DESC, brand",
        Pipeline::pivot("order_year", "brand", "market_share_pct")
            .ratio("revenue", "year_revenue", "market_share_pct")
            .metric(MetricSpec::first_text("Top Brand", "brand"))
            .metric(MetricSpec::first("Top Brand Share (%)", "market_share_pct"))
            .metric(MetricSpec::first("Top Brand Revenue (₹ Cr)", "revenue").scaled(DisplayUnit::Crores))
            .metric(MetricSpec::first("Top Brand Orders", "orders").precision(0)),
    )
}

fn financial_performance(cfg: &ReportsConfig) -> ReportDefinition {
    const BY_SUBCATEGORY: &str = "SELECT order_year,
                subcategory,
                SUM(original_price_inr * quantity) AS gross_sales,
                SUM(original_price_inr * discount_percent / 100.0 * quantity) AS discount_given,
                SUM(final_amount_inr) AS net_revenue,
                SUM(delivery_charges) AS delivery_charges
         FROM orders
         WHERE order_year > :min_year
         GROUP BY order_year, subcategory
         ORDER BY order_year, net_revenue DESC";
    const BY_YEAR: &str = "SELECT order_year,
                SUM(original_price_inr * discount_percent / 100.0 * quantity) AS discount_given,
                SUM(delivery_charges) AS delivery_charges,
                SUM(final_amount_inr) AS net_revenue
         FROM orders
         WHERE order_year > :min_year
         GROUP BY order_year
         ORDER BY order_year";

    let totals = |p: Pipeline| {
        p.metric(MetricSpec::aggregate("Gross Sales (₹ Cr)", "gross_sales", AggFunc::Sum).scaled(DisplayUnit::Crores))
            .metric(MetricSpec::aggregate("Net Revenue (₹ Cr)", "net_revenue", AggFunc::Sum).scaled(DisplayUnit::Crores))
            .metric(
                MetricSpec::aggregate("Discounts Given (₹ Cr)", "discount_given", AggFunc::Sum)
                    .scaled(DisplayUnit::Crores),
            )
            .metric(
                MetricSpec::aggregate("Delivery Charges (₹ Cr)", "delivery_charges", AggFunc::Sum)
                    .scaled(DisplayUnit::Crores),
            )
    };

    views(
        "financial-performance",
        "Financial Performance",
        cfg,
        "view",
        vec![
            (
                "subcategory",
                BY_SUBCATEGORY,
                totals(
                    Pipeline::pivot("order_year", "subcategory", "net_revenue_crores")
                        .scale("net_revenue", DisplayUnit::Crores, "net_revenue_crores"),
                ),
            ),
            (
                "cost-structure",
                BY_YEAR,
                Pipeline::columns(
                    "order_year",
                    &[
                        ("discount_given_crores", "discount_given_crores"),
                        ("delivery_charges_crores", "delivery_charges_crores"),
                        ("net_revenue_crores", "net_revenue_crores"),
                    ],
                )
                .scale("discount_given", DisplayUnit::Crores, "discount_given_crores")
                .scale("delivery_charges", DisplayUnit::Crores, "delivery_charges_crores")
                .scale("net_revenue", DisplayUnit::Crores, "net_revenue_crores")
                .ratio("discount_given", "net_revenue", "discount_to_revenue_pct")
                .metric(
                    MetricSpec::last("Discount to Revenue (%)", "discount_to_revenue_pct"),
                ),
            ),
        ],
    )
}

fn growth_analytics(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "growth-analytics",
        "Growth Analytics",
        cfg,
        "SELECT order_year,
                COUNT(DISTINCT customer_id) AS active_customers,
                COUNT(DISTINCT product_id) AS unique_products,
                SUM(final_amount_inr) AS revenue
         FROM orders
         WHERE order_year > :min_year
         GROUP BY order_year
         ORDER BY order_year",
        Pipeline::columns(
            "order_year",
            &[
                ("active_customers", "active_customers"),
                ("unique_products", "unique_products"),
                ("revenue_crores", "revenue_crores"),
            ],
        )
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .growth("active_customers", "customer_growth_pct")
        .metric(MetricSpec::last("Customers", "active_customers").precision(0).with_delta("customer_growth_pct"))
        .metric(MetricSpec::last("Unique Products", "unique_products").precision(0))
        .metric(MetricSpec::last("Revenue (₹ Cr)", "revenue_crores")),
    )
}

// ──────────────────── revenue ────────────────────

fn revenue_trend(cfg: &ReportsConfig) -> ReportDefinition {
    let trend = || {
        Pipeline::columns("period", &[("revenue_crores", "revenue_crores"), ("growth_pct", "growth_pct")])
            .scale("revenue", DisplayUnit::Crores, "revenue_crores")
    };

    views(
        "revenue-trend",
        "Revenue Trend Analysis",
        cfg,
        "period",
        vec![
            (
                "yearly",
                "SELECT order_year AS period, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year
                 ORDER BY order_year",
                trend()
                    .growth("revenue", "growth_pct")
                    .metric(MetricSpec::last("Latest Revenue (₹ Cr)", "revenue_crores").with_delta("growth_pct")),
            ),
            (
                "quarterly",
                "SELECT order_year || '-Q' || order_quarter AS period, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, order_quarter
                 ORDER BY order_year, order_quarter",
                trend()
                    .growth("revenue", "growth_pct")
                    .metric(MetricSpec::last("Latest Quarter (₹ Cr)", "revenue_crores").with_delta("growth_pct")),
            ),
            (
                "monthly",
                "SELECT printf('%d-%02d', order_year, order_month) AS period,
                        order_year,
                        SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, order_month
                 ORDER BY order_year, order_month",
                trend()
                    .growth_within("revenue", "growth_pct", "order_year")
                    .metric(MetricSpec::last("Latest Month (₹ Cr)", "revenue_crores").with_delta("growth_pct")),
            ),
            (
                "seasonal",
                "SELECT order_month AS period,
                        SUM(final_amount_inr) AS revenue,
                        COUNT(DISTINCT order_year) AS years
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_month
                 ORDER BY order_month",
                Pipeline::columns(
                    "period",
                    &[("avg_revenue_crores", "avg_revenue_crores"), ("years", "years")],
                )
                .quotient("revenue", "years", "avg_revenue")
                .scale("avg_revenue", DisplayUnit::Crores, "avg_revenue_crores"),
            ),
            (
                "forecast",
                "SELECT order_month AS period, AVG(final_amount_inr) AS avg_order_revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_month
                 ORDER BY order_month",
                Pipeline::columns("period", &[("projected_revenue_lakhs", "projected_revenue_lakhs")])
                    .scale("avg_order_revenue", DisplayUnit::ForecastLakhs, "projected_revenue_lakhs"),
            ),
        ],
    )
}

fn category_performance(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "category-performance",
        "Category Performance",
        cfg,
        "view",
        vec![
            (
                "contribution",
                "SELECT subcategory, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY subcategory
                 ORDER BY revenue DESC, subcategory",
                Pipeline::columns(
                    "subcategory",
                    &[("revenue_lakhs", "revenue_lakhs"), ("revenue_share_pct", "revenue_share_pct")],
                )
                .scale("revenue", DisplayUnit::Lakhs, "revenue_lakhs")
                .share("revenue", "revenue_share_pct")
                .metric(MetricSpec::first_text("Leading Subcategory", "subcategory"))
                .metric(MetricSpec::first("Leading Share (%)", "revenue_share_pct")),
            ),
            (
                "yearly",
                "SELECT order_year, subcategory, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, subcategory",
                Pipeline::pivot("order_year", "subcategory", "revenue_lakhs")
                    .scale("revenue", DisplayUnit::Lakhs, "revenue_lakhs"),
            ),
            (
                "market-share",
                "SELECT order_year,
                        subcategory,
                        SUM(final_amount_inr) AS revenue,
                        SUM(SUM(final_amount_inr)) OVER (PARTITION BY order_year) AS year_revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, subcategory",
                Pipeline::pivot("order_year", "subcategory", "market_share_pct")
                    .ratio("revenue", "year_revenue", "market_share_pct"),
            ),
        ],
    )
}

fn geographic_revenue(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "geographic-revenue",
        "Geographic Revenue",
        cfg,
        "view",
        vec![
            (
                "state",
                "SELECT customer_state,
                        SUM(final_amount_inr) AS revenue,
                        COUNT(DISTINCT customer_id) AS customers,
                        COUNT(transaction_id) AS orders
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY customer_state
                 ORDER BY revenue DESC, customer_state",
                Pipeline::columns(
                    "customer_state",
                    &[("revenue_crores", "revenue_crores"), ("customers", "customers"), ("orders", "orders")],
                )
                .scale("revenue", DisplayUnit::Crores, "revenue_crores")
                .metric(MetricSpec::first_text("Top State", "customer_state"))
                .metric(MetricSpec::first("Top State Revenue (₹ Cr)", "revenue_crores")),
            ),
            (
                "city",
                "SELECT customer_state || ' / ' || customer_city AS city,
                        SUM(final_amount_inr) AS revenue,
                        COUNT(DISTINCT customer_id) AS customers,
                        COUNT(transaction_id) AS orders
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY customer_state, customer_city
                 ORDER BY customer_state, revenue DESC",
                Pipeline::columns(
                    "city",
                    &[("revenue_crores", "revenue_crores"), ("customers", "customers"), ("orders", "orders")],
                )
                .scale("revenue", DisplayUnit::Crores, "revenue_crores"),
            ),
            (
                "tier",
                "SELECT customer_tier, SUM(final_amount_inr) AS revenue, COUNT(*) AS orders
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY customer_tier
                 ORDER BY revenue DESC, customer_tier",
                Pipeline::columns("customer_tier", &[("revenue_crores", "revenue_crores"), ("orders", "orders")])
                    .scale("revenue", DisplayUnit::Crores, "revenue_crores")
                    .share("revenue", "revenue_share_pct")
                    .metric(MetricSpec::first_text("Top Tier", "customer_tier"))
                    .metric(MetricSpec::first("Top Tier Share (%)", "revenue_share_pct")),
            ),
            (
                "yearly-state",
                "SELECT order_year, customer_state, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, customer_state",
                Pipeline::pivot("order_year", "customer_state", "revenue_crores")
                    .scale("revenue", DisplayUnit::Crores, "revenue_crores"),
            ),
            (
                "penetration",
                "WITH per_customer AS (
                     SELECT customer_id, customer_state, MAX(order_year) AS last_year
                     FROM orders
                     WHERE order_year > :min_year
                     GROUP BY customer_id, customer_state
                 ),
                 latest AS (
                     SELECT MAX(order_year) AS year FROM orders WHERE order_year > :min_year
                 )
                 SELECT customer_state,
                        COUNT(*) AS customers,
                        SUM(CASE WHEN last_year = (SELECT year FROM latest) THEN 1 ELSE 0 END) AS active_customers
                 FROM per_customer
                 GROUP BY customer_state",
                Pipeline::columns(
                    "customer_state",
                    &[
                        ("customers", "customers"),
                        ("active_customers", "active_customers"),
                        ("penetration_pct", "penetration_pct"),
                    ],
                )
                .ratio("active_customers", "customers", "penetration_pct")
                .sort_desc("penetration_pct"),
            ),
        ],
    )
}

fn festival_sales(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "festival-sales",
        "Festival Sales Analytics",
        cfg,
        "SELECT order_year,
                SUM(final_amount_inr) AS revenue,
                COUNT(transaction_id) AS orders,
                COUNT(DISTINCT customer_id) AS customers,
                SUM(CASE WHEN is_prime_member = 1 THEN final_amount_inr ELSE 0 END) AS prime_revenue
         FROM orders
         WHERE is_festival_sale = 1 AND order_year > :min_year
         GROUP BY order_year
         ORDER BY order_year",
        Pipeline::columns(
            "order_year",
            &[
                ("festival_revenue_crores", "festival_revenue_crores"),
                ("avg_order_value", "avg_order_value"),
                ("orders", "orders"),
            ],
        )
        .scale("revenue", DisplayUnit::Crores, "festival_revenue_crores")
        .quotient("revenue", "orders", "avg_order_value")
        .ratio("prime_revenue", "revenue", "prime_revenue_share_pct")
        .metric(MetricSpec::last("Festival Revenue (₹ Cr)", "festival_revenue_crores"))
        .metric(MetricSpec::last("Festival Orders", "orders").precision(0))
        .metric(MetricSpec::last("Festival Customers", "customers").precision(0))
        .metric(MetricSpec::last("Prime Revenue Share (%)", "prime_revenue_share_pct")),
    )
}

fn price_optimization(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "price-optimization",
        "Price Optimization",
        cfg,
        "view",
        vec![
            (
                "discount",
                "SELECT discount_percent, quantity, final_amount_inr
                 FROM orders
                 WHERE discount_percent IS NOT NULL AND order_year > :min_year",
                Pipeline::columns(
                    "discount_percent",
                    &[("revenue_crores", "revenue_crores"), ("avg_order_value", "avg_order_value")],
                )
                .bucket("discount_percent", 1.0)
                .group_by(
                    &["discount_percent"],
                    vec![
                        Aggregation::new("final_amount_inr", AggFunc::Count, "orders"),
                        Aggregation::new("quantity", AggFunc::Sum, "units"),
                        Aggregation::new("final_amount_inr", AggFunc::Sum, "revenue"),
                    ],
                )
                .scale("revenue", DisplayUnit::Crores, "revenue_crores")
                .quotient("revenue", "orders", "avg_order_value"),
            ),
            (
                "elasticity",
                "SELECT bucket(discounted_price_inr, 100) AS price_band,
                        SUM(quantity) AS units,
                        SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY price_band
                 ORDER BY price_band",
                Pipeline::columns("price_band", &[("units", "units"), ("revenue_crores", "revenue_crores")])
                    .scale("revenue", DisplayUnit::Crores, "revenue_crores"),
            ),
        ],
    )
}

// ──────────────────── customers ────────────────────

fn customer_segmentation(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "customer-segmentation",
        "Customer Segmentation (RFM)",
        cfg,
        "SELECT customer_id,
                COUNT(transaction_id) AS frequency,
                SUM(final_amount_inr) AS monetary_value,
                CAST(julianday(MAX(order_date)) - julianday(MIN(order_date)) AS INTEGER) AS recency_days
         FROM orders
         WHERE order_year > :min_year
         GROUP BY customer_id
         ORDER BY customer_id",
        Pipeline::columns(
            "customer_id",
            &[
                ("monetary_value", "monetary_value"),
                ("frequency", "frequency"),
                ("recency_days", "recency_days"),
            ],
        )
        .top("monetary_value", cfg.top_products)
        .metric(MetricSpec::aggregate("Avg Recency (Days)", "recency_days", AggFunc::Mean).precision(1).raw())
        .metric(MetricSpec::aggregate("Avg Frequency", "frequency", AggFunc::Mean).precision(1).raw())
        .metric(MetricSpec::aggregate("Avg Monetary Value (₹)", "monetary_value", AggFunc::Mean).raw()),
    )
}

fn customer_journey(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "customer-journey",
        "Customer Journey Analytics",
        cfg,
        "SELECT customer_id,
                MIN(order_date) AS first_order_date,
                MAX(order_date) AS last_order_date,
                CAST(julianday(MAX(order_date)) - julianday(MIN(order_date)) AS INTEGER) AS span_days,
                COUNT(DISTINCT subcategory) AS categories,
                COUNT(transaction_id) AS orders
         FROM orders
         WHERE order_year > :min_year
         GROUP BY customer_id
         ORDER BY customer_id",
        Pipeline::columns(
            "customer_id",
            &[("orders", "orders"), ("categories", "categories"), ("span_days", "span_days")],
        )
        .top("orders", cfg.top_products)
        .metric(MetricSpec::row_count("Customers").raw())
        .metric(MetricSpec::aggregate("Avg Journey Span (Days)", "span_days", AggFunc::Mean).precision(1).raw())
        .metric(MetricSpec::aggregate("Avg Categories", "categories", AggFunc::Mean).raw()),
    )
}

fn prime_membership(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "prime-membership",
        "Prime Membership Analytics",
        cfg,
        "SELECT CASE WHEN is_prime_member = 1 THEN 'Prime' ELSE 'Non-Prime' END AS membership,
                COUNT(DISTINCT customer_id) AS customers,
                SUM(final_amount_inr) AS revenue,
                ROUND(AVG(customer_rating), 2) AS avg_rating
         FROM orders
         WHERE order_year > :min_year
         GROUP BY is_prime_member
         ORDER BY is_prime_member DESC",
        Pipeline::columns(
            "membership",
            &[
                ("customers", "customers"),
                ("revenue_crores", "revenue_crores"),
                ("revenue_per_customer", "revenue_per_customer"),
                ("avg_rating", "avg_rating"),
            ],
        )
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .quotient("revenue", "customers", "revenue_per_customer")
        .share("revenue", "revenue_share_pct")
        .metric(MetricSpec::first("Prime Revenue Share (%)", "revenue_share_pct"))
        .metric(MetricSpec::aggregate("Total Customers", "customers", AggFunc::Sum).precision(0)),
    )
}

fn customer_retention(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "customer-retention",
        "Customer Retention",
        cfg,
        "view",
        vec![
            (
                "churn",
                "SELECT customer_id,
                        MAX(order_date) AS last_order_date,
                        CASE WHEN julianday(:cutoff_date) - julianday(MAX(order_date)) > :churn_days
                             THEN 1 ELSE 0 END AS churn_label,
                        CASE WHEN julianday(:cutoff_date) - julianday(MAX(order_date)) > :churn_days
                             THEN 'Churned' ELSE 'Active' END AS status
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY customer_id
                 ORDER BY customer_id",
                Pipeline::columns("status", &[("customers", "customers")])
                    .value_counts("status", "customers")
                    .metric(MetricSpec::row_count("Total Customers").raw())
                    .metric(MetricSpec::aggregate("Churned Customers", "churn_label", AggFunc::Sum).precision(0).raw())
                    .metric(MetricSpec::share_above("Churn Rate (%)", "churn_label", 0.5).raw())
                    .metric(MetricSpec::share_at_most("Retention Rate (%)", "churn_label", 0.5).raw()),
            ),
            (
                "strategy",
                "WITH per_customer AS (
                     SELECT customer_id,
                            MAX(order_date) AS last_order_date,
                            AVG(discount_percent) AS avg_discount,
                            MAX(is_prime_member) AS is_prime_member
                     FROM orders
                     WHERE order_year > :min_year
                     GROUP BY customer_id
                 ),
                 labelled AS (
                     SELECT is_prime_member,
                            avg_discount,
                            CASE WHEN julianday(:cutoff_date) - julianday(last_order_date) > :churn_days
                                 THEN 1 ELSE 0 END AS churn_label
                     FROM per_customer
                 )
                 SELECT CASE WHEN is_prime_member = 1 THEN 'Prime Member' ELSE 'Non-Prime' END AS customer_type,
                        ROUND(AVG(avg_discount), 2) AS avg_discount,
                        COUNT(*) AS customers,
                        SUM(churn_label) AS churned,
                        COUNT(*) - SUM(churn_label) AS retained
                 FROM labelled
                 GROUP BY is_prime_member
                 ORDER BY is_prime_member DESC",
                Pipeline::columns(
                    "customer_type",
                    &[
                        ("retention_rate_pct", "retention_rate_pct"),
                        ("churn_rate_pct", "churn_rate_pct"),
                        ("avg_discount", "avg_discount"),
                    ],
                )
                .ratio("churned", "customers", "churn_rate_pct")
                .ratio("retained", "customers", "retention_rate_pct"),
            ),
        ],
    )
    .param(ParameterSpec::date("cutoff_date", &cfg.cutoff_date))
    .param(ParameterSpec::integer("churn_days", cfg.churn_days, 1, 3650))
}

fn demographics(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "demographics",
        "Demographics & Behavior",
        cfg,
        "SELECT customer_age_group,
                customer_tier,
                COUNT(DISTINCT customer_id) AS customers,
                SUM(final_amount_inr) AS revenue
         FROM orders
         WHERE order_year > :min_year
         GROUP BY customer_age_group, customer_tier",
        Pipeline::pivot("customer_age_group", "customer_tier", "revenue_crores")
            .scale("revenue", DisplayUnit::Crores, "revenue_crores")
            .metric(MetricSpec::aggregate("Revenue (₹ Cr)", "revenue", AggFunc::Sum).scaled(DisplayUnit::Crores)),
    )
}

// ──────────────────── products ────────────────────

fn product_performance(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "product-performance",
        "Product Performance",
        cfg,
        "SELECT product_name AS product, subcategory, brand, quantity, final_amount_inr, customer_id
         FROM orders
         WHERE order_year > :min_year",
        Pipeline::columns(
            "product",
            &[("revenue_crores", "revenue_crores"), ("units", "units"), ("customers", "customers")],
        )
        .group_by(
            &["product"],
            vec![
                Aggregation::new("quantity", AggFunc::Sum, "units"),
                Aggregation::new("final_amount_inr", AggFunc::Sum, "revenue"),
                Aggregation::new("customer_id", AggFunc::CountDistinct, "customers"),
            ],
        )
        .top("revenue", cfg.top_products)
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .metric(MetricSpec::first_text("Top Product", "product"))
        .metric(MetricSpec::first("Top Product Revenue (₹ Cr)", "revenue_crores")),
    )
}

fn brand_analytics(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "brand-analytics",
        "Brand Analytics",
        cfg,
        "SELECT brand, quantity, final_amount_inr, customer_id
         FROM orders
         WHERE order_year > :min_year",
        Pipeline::columns(
            "brand",
            &[("revenue_crores", "revenue_crores"), ("units", "units"), ("customers", "customers")],
        )
        .group_by(
            &["brand"],
            vec![
                Aggregation::new("quantity", AggFunc::Sum, "units"),
                Aggregation::new("final_amount_inr", AggFunc::Sum, "revenue"),
                Aggregation::new("customer_id", AggFunc::CountDistinct, "customers"),
            ],
        )
        .top("revenue", cfg.top_brands)
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .share("revenue", "revenue_share_pct")
        .metric(MetricSpec::first_text("Top Brand", "brand"))
        .metric(MetricSpec::first("Top Brand Share (%)", "revenue_share_pct")),
    )
}

fn inventory_optimization(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "inventory-optimization",
        "Inventory Optimization",
        cfg,
        "SELECT product_name AS product, subcategory, order_month, quantity
         FROM orders
         WHERE order_year > :min_year",
        Pipeline::columns(
            "product",
            &[("total_units", "total_units"), ("avg_units_per_order", "avg_units_per_order")],
        )
        .group_by(
            &["product"],
            vec![
                Aggregation::new("quantity", AggFunc::Sum, "total_units"),
                Aggregation::new("quantity", AggFunc::Count, "orders"),
            ],
        )
        .quotient("total_units", "orders", "avg_units_per_order")
        .top("total_units", cfg.top_products)
        .metric(MetricSpec::first_text("Fastest Mover", "product"))
        .metric(MetricSpec::aggregate("Units Sold", "quantity", AggFunc::Sum).precision(0).raw()),
    )
}

fn product_ratings(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "product-ratings",
        "Product Ratings & Reviews",
        cfg,
        "SELECT product_name AS product, product_rating
         FROM orders
         WHERE product_rating IS NOT NULL AND order_year > :min_year",
        Pipeline::columns("product", &[("avg_rating", "avg_rating"), ("reviews", "reviews")])
            .group_by(
                &["product"],
                vec![
                    Aggregation::new("product_rating", AggFunc::Sum, "rating_total"),
                    Aggregation::new("product_rating", AggFunc::Count, "reviews"),
                ],
            )
            .quotient("rating_total", "reviews", "avg_rating")
            .top("avg_rating", cfg.top_products)
            .metric(MetricSpec::aggregate("Avg Product Rating", "product_rating", AggFunc::Mean).raw())
            .metric(MetricSpec::row_count("Reviews").raw()),
    )
}

fn product_launch(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "product-launch",
        "Product Launch Tracker",
        cfg,
        "SELECT order_year,
                product_name,
                SUM(quantity) AS units,
                SUM(final_amount_inr) AS revenue
         FROM orders
         WHERE order_year > :min_year
         GROUP BY product_id, product_name, order_year
         ORDER BY order_year, revenue DESC",
        Pipeline::columns(
            "order_year",
            &[
                ("units", "units"),
                ("revenue_crores", "revenue_crores"),
                ("products", "products"),
                ("units_growth_pct", "units_growth_pct"),
            ],
        )
        .group_by(
            &["order_year"],
            vec![
                Aggregation::new("units", AggFunc::Sum, "units"),
                Aggregation::new("revenue", AggFunc::Sum, "revenue"),
                Aggregation::new("product_name", AggFunc::CountDistinct, "products"),
            ],
        )
        .scale("revenue", DisplayUnit::Crores, "revenue_crores")
        .growth("units", "units_growth_pct")
        .metric(MetricSpec::last("Units This Year", "units").precision(0).with_delta("units_growth_pct")),
    )
}

// ──────────────────── operations ────────────────────

fn delivery_performance(cfg: &ReportsConfig) -> ReportDefinition {
    let kpis = |p: Pipeline| {
        p.metric(MetricSpec::aggregate("Average Delivery Days", "delivery_days", AggFunc::Mean).raw())
            .metric(MetricSpec::share_at_most("On-time Delivery Rate (%)", "delivery_days", cfg.on_time_days as f64).raw())
    };
    views(
        "delivery-performance",
        "Delivery Performance",
        cfg,
        "view",
        vec![
            (
                "trend",
                "SELECT printf('%d-%02d', order_year, order_month) AS period, delivery_days
                 FROM orders
                 WHERE order_year > :min_year",
                kpis(
                    Pipeline::columns("period", &[("avg_delivery_days", "avg_delivery_days")])
                        .group_by(
                            &["period"],
                            vec![
                                Aggregation::new("delivery_days", AggFunc::Sum, "total_days"),
                                Aggregation::new("delivery_days", AggFunc::Count, "deliveries"),
                            ],
                        )
                        .quotient("total_days", "deliveries", "avg_delivery_days"),
                ),
            ),
            (
                "distribution",
                "SELECT delivery_days
                 FROM orders
                 WHERE order_year > :min_year",
                kpis(
                    Pipeline::columns("delivery_days", &[("orders", "orders")])
                        .value_counts("delivery_days", "orders"),
                ),
            ),
        ],
    )
}

fn payment_analytics(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "payment-analytics",
        "Payment Analytics",
        cfg,
        "view",
        vec![
            (
                "preferences",
                "SELECT payment_method,
                        COUNT(*) AS transactions,
                        SUM(final_amount_inr) AS total_amount
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY payment_method
                 ORDER BY transactions DESC, payment_method",
                Pipeline::columns(
                    "payment_method",
                    &[
                        ("pct_of_transactions", "pct_of_transactions"),
                        ("avg_transaction_value", "avg_transaction_value"),
                    ],
                )
                .share("transactions", "pct_of_transactions")
                .quotient("total_amount", "transactions", "avg_transaction_value")
                .metric(MetricSpec::aggregate("Total Transactions", "transactions", AggFunc::Sum).precision(0))
                .metric(MetricSpec::aggregate("Total Amount (₹)", "total_amount", AggFunc::Sum)),
            ),
            (
                "trends",
                "SELECT printf('%d-%02d', order_year, order_month) AS period,
                        payment_method,
                        COUNT(*) AS transactions
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, order_month, payment_method",
                Pipeline::pivot("period", "payment_method", "transactions"),
            ),
        ],
    )
}

fn returns_cancellations(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "returns-cancellations",
        "Returns & Cancellations",
        cfg,
        "SELECT subcategory,
                COUNT(*) AS orders,
                SUM(CASE WHEN return_status = 'Returned' THEN 1 ELSE 0 END) AS returned,
                SUM(CASE WHEN return_status = 'Cancelled' THEN 1 ELSE 0 END) AS cancelled,
                SUM(final_amount_inr) AS revenue,
                SUM(CASE WHEN return_status = 'Returned' THEN final_amount_inr ELSE 0 END) AS return_value,
                SUM(CASE WHEN return_status = 'Cancelled' THEN final_amount_inr ELSE 0 END) AS cancel_value,
                SUM(CASE WHEN return_status IN ('Returned', 'Cancelled') THEN final_amount_inr ELSE 0 END)
                    AS loss_value
         FROM orders
         WHERE order_year > :min_year
         GROUP BY subcategory
         ORDER BY subcategory",
        Pipeline::columns(
            "subcategory",
            &[("return_rate_pct", "return_rate_pct"), ("cancel_rate_pct", "cancel_rate_pct")],
        )
        .ratio("return_value", "revenue", "return_rate_pct")
        .ratio("cancel_value", "revenue", "cancel_rate_pct")
        .sort_desc("return_rate_pct")
        .metric(MetricSpec::aggregate("Total Orders", "orders", AggFunc::Sum).precision(0))
        .metric(MetricSpec::aggregate("Returned Orders", "returned", AggFunc::Sum).precision(0))
        .metric(MetricSpec::aggregate("Cancelled Orders", "cancelled", AggFunc::Sum).precision(0))
        .metric(MetricSpec::aggregate("Total Loss Value (₹)", "loss_value", AggFunc::Sum)),
    )
}

fn customer_service(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "customer-service",
        "Customer Service",
        cfg,
        "view",
        vec![
            (
                "summary",
                "SELECT ROUND(AVG(customer_rating), 2) AS avg_rating,
                        COUNT(CASE WHEN return_status = 'Returned' THEN 1 END) AS returns,
                        COUNT(CASE WHEN return_status = 'Cancelled' THEN 1 END) AS cancellations,
                        AVG(delivery_days) AS avg_delivery_days,
                        SUM(CASE WHEN delivery_days > :late_days THEN 1 ELSE 0 END) AS delayed,
                        COUNT(*) AS orders
                 FROM orders
                 WHERE order_year > :min_year",
                Pipeline::metrics_only()
                    .ratio("delayed", "orders", "delayed_pct")
                    .metric(MetricSpec::first("Avg Satisfaction", "avg_rating"))
                    .metric(MetricSpec::first("Total Returns", "returns").precision(0))
                    .metric(MetricSpec::first("Total Cancellations", "cancellations").precision(0))
                    .metric(MetricSpec::first("Avg Delivery Days", "avg_delivery_days").precision(1))
                    .metric(MetricSpec::first("Delayed Deliveries (%)", "delayed_pct")),
            ),
            (
                "trends",
                "SELECT printf('%d-%02d', order_year, order_month) AS period,
                        ROUND(AVG(customer_rating), 2) AS avg_rating,
                        COUNT(*) AS orders,
                        SUM(CASE WHEN return_status = 'Returned' THEN 1 ELSE 0 END) AS returns,
                        SUM(CASE WHEN return_status = 'Cancelled' THEN 1 ELSE 0 END) AS cancellations
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, order_month
                 ORDER BY order_year, order_month",
                Pipeline::columns(
                    "period",
                    &[
                        ("avg_rating", "avg_rating"),
                        ("return_rate_pct", "return_rate_pct"),
                        ("cancel_rate_pct", "cancel_rate_pct"),
                    ],
                )
                .ratio("returns", "orders", "return_rate_pct")
                .ratio("cancellations", "orders", "cancel_rate_pct"),
            ),
        ],
    )
    .param(late_days(cfg))
}

fn supply_chain(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "supply-chain",
        "Supply Chain",
        cfg,
        "view",
        vec![
            (
                "suppliers",
                "SELECT brand AS supplier,
                        COUNT(*) AS orders,
                        SUM(quantity) AS units,
                        SUM(final_amount_inr) AS revenue,
                        ROUND(AVG(delivery_days), 2) AS avg_delivery_days,
                        SUM(CASE WHEN delivery_days > :late_days THEN 1 ELSE 0 END) AS late,
                        SUM(CASE WHEN return_status = 'Returned' THEN 1 ELSE 0 END) AS returned,
                        ROUND(AVG(customer_rating), 2) AS avg_rating
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY brand
                 HAVING COUNT(*) > :min_orders
                 ORDER BY brand",
                Pipeline::columns(
                    "supplier",
                    &[
                        ("late_delivery_pct", "late_delivery_pct"),
                        ("return_rate_pct", "return_rate_pct"),
                        ("avg_delivery_days", "avg_delivery_days"),
                    ],
                )
                .ratio("late", "orders", "late_delivery_pct")
                .ratio("returned", "orders", "return_rate_pct")
                // most reliable first: late share, then return share
                .sort_asc("return_rate_pct")
                .sort_asc("late_delivery_pct")
                .metric(MetricSpec::first_text("Most Reliable Supplier", "supplier"))
                .metric(MetricSpec::first("Orders", "orders").precision(0))
                .metric(MetricSpec::first("Units Supplied", "units").precision(0))
                .metric(MetricSpec::first("Avg Delivery Days", "avg_delivery_days").precision(1))
                .metric(MetricSpec::first("Return Rate (%)", "return_rate_pct")),
            ),
            (
                "revenue",
                "SELECT brand AS supplier, COUNT(*) AS orders, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY brand
                 ORDER BY revenue DESC, brand",
                Pipeline::columns("supplier", &[("revenue_crores", "revenue_crores"), ("revenue_share_pct", "revenue_share_pct")])
                    .top("revenue", cfg.top_suppliers)
                    .scale("revenue", DisplayUnit::Crores, "revenue_crores")
                    .share("revenue", "revenue_share_pct"),
            ),
            (
                "reliability",
                "SELECT printf('%d-%02d', order_year, order_month) AS period,
                        brand AS supplier,
                        COUNT(*) AS orders,
                        SUM(CASE WHEN delivery_days > :late_days THEN 1 ELSE 0 END) AS late
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_year, order_month, brand",
                Pipeline::pivot("period", "supplier", "late_delivery_pct")
                    .ratio("late", "orders", "late_delivery_pct"),
            ),
        ],
    )
    .param(late_days(cfg))
    .param(ParameterSpec::integer("min_orders", cfg.supplier_min_orders, 0, 1_000_000))
}

// ──────────────────── planning ────────────────────

fn predictive_analytics(cfg: &ReportsConfig) -> ReportDefinition {
    single(
        "predictive-analytics",
        "Predictive Analytics",
        cfg,
        "SELECT order_date, customer_id, final_amount_inr
         FROM orders
         WHERE order_year > :min_year
         ORDER BY order_date",
        Pipeline::columns("order_date", &[("revenue", "revenue"), ("rolling_avg", "rolling_avg")])
            .group_by(&["order_date"], vec![Aggregation::new("final_amount_inr", AggFunc::Sum, "revenue")])
            .rolling("revenue", cfg.rolling_window, "rolling_avg")
            .metric(MetricSpec::aggregate("Total Revenue (₹)", "final_amount_inr", AggFunc::Sum).precision(0).raw())
            .metric(
                MetricSpec::inactive(
                    "Estimated Churn Rate (%)",
                    "customer_id",
                    "order_date",
                    cfg.inactivity_days,
                )
                .raw(),
            ),
    )
}

fn market_intelligence(cfg: &ReportsConfig) -> ReportDefinition {
    let by = |key: &'static str| {
        Pipeline::columns(key, &[("revenue_crores", "revenue_crores"), ("revenue_share_pct", "revenue_share_pct")])
            .scale("revenue", DisplayUnit::Crores, "revenue_crores")
            .share("revenue", "revenue_share_pct")
            .metric(MetricSpec::first_text("Leader", key))
            .metric(MetricSpec::first("Leader Share (%)", "revenue_share_pct"))
    };
    views(
        "market-intelligence",
        "Market Intelligence",
        cfg,
        "view",
        vec![
            (
                "brand",
                "SELECT brand, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY brand
                 ORDER BY revenue DESC, brand",
                by("brand"),
            ),
            (
                "subcategory",
                "SELECT subcategory, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY subcategory
                 ORDER BY revenue DESC, subcategory",
                by("subcategory"),
            ),
            (
                "top-brands",
                "SELECT brand, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY brand
                 ORDER BY brand",
                by("brand").top("revenue", 5),
            ),
        ],
    )
}

fn cross_selling(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "cross-selling",
        "Cross-selling & Upselling",
        cfg,
        "view",
        vec![
            (
                "subcategories",
                "SELECT subcategory,
                        COUNT(*) AS purchases,
                        COUNT(DISTINCT customer_id) AS customers
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY subcategory
                 ORDER BY subcategory",
                Pipeline::columns("subcategory", &[("purchases", "purchases"), ("customers", "customers")])
                    .top("purchases", CROSS_SELL_TOP),
            ),
            (
                "diversity",
                "SELECT customer_id, COUNT(DISTINCT subcategory) AS subcategories
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY customer_id",
                Pipeline::columns("subcategories", &[("customers", "customers")])
                    .value_counts("subcategories", "customers")
                    .metric(MetricSpec::share_above("Multi-category Customers (%)", "subcategories", 1.0).raw()),
            ),
        ],
    )
}

fn seasonal_planning(cfg: &ReportsConfig) -> ReportDefinition {
    views(
        "seasonal-planning",
        "Seasonal Planning",
        cfg,
        "view",
        vec![
            (
                "revenue",
                "SELECT order_month AS month, SUM(final_amount_inr) AS revenue
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_month
                 ORDER BY order_month",
                Pipeline::columns("month", &[("revenue_crores", "revenue_crores")])
                    .scale("revenue", DisplayUnit::Crores, "revenue_crores")
                    .share("revenue", "revenue_share_pct")
                    .metric(MetricSpec::aggregate("Peak Month Share (%)", "revenue_share_pct", AggFunc::Max)),
            ),
            (
                "quantity",
                "SELECT order_month AS month, subcategory, SUM(quantity) AS units
                 FROM orders
                 WHERE order_year > :min_year
                 GROUP BY order_month, subcategory",
                Pipeline::pivot("month", "subcategory", "units"),
            ),
        ],
    )
}

fn command_center(cfg: &ReportsConfig) -> ReportDefinition {
    const ORDER_LINES: &str = "SELECT order_date, customer_id, subcategory, payment_method, final_amount_inr, quantity
         FROM orders
         WHERE order_year > :min_year";

    let breakdown = |key: &str| {
        Pipeline::columns(key, &[("revenue_crores", "revenue_crores")])
            .group_by(&[key], vec![Aggregation::new("final_amount_inr", AggFunc::Sum, "revenue")])
            .scale("revenue", DisplayUnit::Crores, "revenue_crores")
            .metric(
                MetricSpec::aggregate("Total Revenue (₹ Cr)", "final_amount_inr", AggFunc::Sum)
                    .scaled(DisplayUnit::Crores)
                    .raw(),
            )
            .metric(MetricSpec::aggregate("Total Customers", "customer_id", AggFunc::CountDistinct).raw())
            .metric(MetricSpec::row_count("Total Orders").raw())
            .metric(MetricSpec::aggregate("Total Quantity Sold", "quantity", AggFunc::Sum).precision(0).raw())
    };

    views(
        "command-center",
        "Business Intelligence Command Center",
        cfg,
        "view",
        vec![
            ("subcategory", ORDER_LINES, breakdown("subcategory")),
            ("payment", ORDER_LINES, breakdown("payment_method")),
            ("daily", ORDER_LINES, breakdown("order_date")),
        ],
    )
}
