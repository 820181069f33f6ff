use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::numeric::{growth_pct, ratio, serialize_money, SHARE_DECIMALS};
use crate::domain::order::Order;

// ============================================================================
// Time Series - dense monthly / daily / weekday buckets
// ============================================================================
//
// Every series has one entry per period in range, oldest first, zero-filled
// where nothing was ordered. Orders dated after `now` fall outside every
// range.
//
// ============================================================================

pub const DEFAULT_MONTHS_BACK: u32 = 6;
pub const DEFAULT_DAYS_BACK: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
    #[serde(serialize_with = "serialize_money")]
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
    #[serde(serialize_with = "serialize_money")]
    pub avg_order_value: f64,
    /// Day-over-day revenue change in percent
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCount {
    /// `Mon` .. `Sun`
    pub day: String,
    pub date: NaiveDate,
    pub count: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
}

/// Months since year 0, so consecutive months differ by one
fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn month_label(index: i64) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// Trailing `months_back` calendar months including the current one
pub fn bucket_by_month(orders: &[Order], months_back: u32, now: DateTime<Utc>) -> Vec<MonthBucket> {
    if months_back == 0 {
        return Vec::new();
    }

    let current = month_index(now.year(), now.month());
    let first = current - (months_back as i64 - 1);
    if first < month_index(NaiveDate::MIN.year(), 1) {
        tracing::warn!(months_back, "Monthly range out of range, returning no buckets");
        return Vec::new();
    }

    let mut totals: HashMap<i64, (usize, f64)> = HashMap::new();
    for order in orders.iter().filter(|order| order.order_date <= now) {
        let index = month_index(order.order_date.year(), order.order_date.month());
        if index >= first {
            let entry = totals.entry(index).or_default();
            entry.0 += 1;
            entry.1 += order.value();
        }
    }

    (first..=current)
        .map(|index| {
            let (count, revenue) = totals.get(&index).copied().unwrap_or_default();
            MonthBucket {
                month: month_label(index),
                count,
                revenue,
                avg_order_value: ratio(revenue, count as f64),
            }
        })
        .collect()
}

/// Trailing `days_back` calendar days (UTC) including today. A range that
/// starts before the representable calendar yields no buckets.
pub fn bucket_by_day(orders: &[Order], days_back: u32, now: DateTime<Utc>) -> Vec<DayBucket> {
    if days_back == 0 {
        return Vec::new();
    }

    let today = now.date_naive();
    let Some(first) = Duration::try_days(days_back as i64 - 1).and_then(|span| today.checked_sub_signed(span))
    else {
        tracing::warn!(days_back, "Daily range out of range, returning no buckets");
        return Vec::new();
    };

    let mut totals: HashMap<NaiveDate, (usize, f64)> = HashMap::new();
    for order in orders.iter().filter(|order| order.order_date <= now) {
        let date = order.order_date.date_naive();
        if date >= first {
            let entry = totals.entry(date).or_default();
            entry.0 += 1;
            entry.1 += order.value();
        }
    }

    first
        .iter_days()
        .take(days_back as usize)
        .map(|date| {
            let (count, revenue) = totals.get(&date).copied().unwrap_or_default();
            DayBucket { date, count, revenue }
        })
        .collect()
}

/// Day-over-day revenue growth. The first day, and any day after a day with
/// no revenue, reports 0.
pub fn daily_revenue_with_growth(buckets: &[DayBucket]) -> Vec<DailyRevenue> {
    let mut previous_revenue = 0.0;
    buckets
        .iter()
        .map(|bucket| {
            let growth = growth_pct(bucket.revenue, previous_revenue, SHARE_DECIMALS);
            previous_revenue = bucket.revenue;
            DailyRevenue {
                date: bucket.date,
                orders: bucket.count,
                revenue: bucket.revenue,
                avg_order_value: ratio(bucket.revenue, bucket.count as f64),
                growth,
            }
        })
        .collect()
}

/// Last seven days labelled by weekday, oldest first
pub fn weekly_orders(orders: &[Order], now: DateTime<Utc>) -> Vec<WeekdayCount> {
    bucket_by_day(orders, 7, now)
        .into_iter()
        .map(|bucket| WeekdayCount {
            day: bucket.date.format("%a").to_string(),
            date: bucket.date,
            count: bucket.count,
            revenue: bucket.revenue,
        })
        .collect()
}
