use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::breakdown::{category_breakdown, recent_orders, status_breakdown, top_products};
use super::breakdown::{CategorySales, ProductSales, StatusShare};
use super::geography::{customer_locations, geographic_breakdown, CountrySales, CustomerLocation};
use super::geography::DEFAULT_TOP_COUNTRIES;
use super::growth::{compute_period_growth, PeriodGrowth, DEFAULT_GROWTH_WINDOW_DAYS};
use super::segments::{orders_by_customer, segment_customers, SegmentStats};
use super::series::{bucket_by_day, bucket_by_month, daily_revenue_with_growth, weekly_orders};
use super::series::{DailyRevenue, MonthBucket, WeekdayCount, DEFAULT_DAYS_BACK, DEFAULT_MONTHS_BACK};
use super::snapshot::{OrderSnapshot, SkippedRecord};
use super::summary::{compute_summary, OrderSummary};
use crate::domain::customer::{Customer, CustomerSegment};
use crate::domain::order::Order;
use crate::geo::CountryResolver;

// ============================================================================
// Dashboard Report - every figure for one snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    pub growth_window_days: i64,
    pub months_back: u32,
    pub days_back: u32,
    pub top_countries: usize,
    pub top_products: usize,
    pub recent_orders: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            growth_window_days: DEFAULT_GROWTH_WINDOW_DAYS,
            months_back: DEFAULT_MONTHS_BACK,
            days_back: DEFAULT_DAYS_BACK,
            top_countries: DEFAULT_TOP_COUNTRIES,
            top_products: 5,
            recent_orders: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: OrderSummary,
    #[serde(flatten)]
    pub growth: PeriodGrowth,
    pub monthly_orders: Vec<MonthBucket>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub weekly_orders: Vec<WeekdayCount>,
    pub status_breakdown: Vec<StatusShare>,
    pub customer_segments: BTreeMap<CustomerSegment, SegmentStats>,
    pub top_shipping_countries: Vec<CountrySales>,
    pub customer_locations: Vec<CustomerLocation>,
    pub category_breakdown: Vec<CategorySales>,
    pub top_products: Vec<ProductSales>,
    pub recent_orders: Vec<Order>,
    pub skipped_records: Vec<SkippedRecord>,
}

impl DashboardReport {
    pub fn build(
        snapshot: &OrderSnapshot,
        customers: &[Customer],
        resolver: &dyn CountryResolver,
        now: DateTime<Utc>,
        options: &DashboardOptions,
    ) -> Self {
        let orders = snapshot.orders();

        let mut summary = compute_summary(orders);
        if !customers.is_empty() {
            summary.total_customers = customers.len();
        }

        let grouped = orders_by_customer(orders);
        let daily = bucket_by_day(orders, options.days_back, now);

        let report = Self {
            generated_at: now,
            summary,
            growth: compute_period_growth(orders, now, options.growth_window_days),
            monthly_orders: bucket_by_month(orders, options.months_back, now),
            daily_revenue: daily_revenue_with_growth(&daily),
            weekly_orders: weekly_orders(orders, now),
            status_breakdown: status_breakdown(orders),
            customer_segments: segment_customers(customers, &grouped),
            top_shipping_countries: geographic_breakdown(orders, resolver, options.top_countries),
            customer_locations: customer_locations(customers, resolver),
            category_breakdown: category_breakdown(orders),
            top_products: top_products(orders, options.top_products),
            recent_orders: recent_orders(orders, options.recent_orders),
            skipped_records: snapshot.skipped().to_vec(),
        };

        tracing::debug!(
            orders = orders.len(),
            customers = customers.len(),
            skipped = report.skipped_records.len(),
            "Dashboard report built"
        );

        report
    }
}
