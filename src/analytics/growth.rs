use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::numeric::{growth_pct, serialize_money, GROWTH_DECIMALS};
use crate::domain::order::Order;

pub const DEFAULT_GROWTH_WINDOW_DAYS: i64 = 30;

/// Orders and revenue inside `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
}

impl PeriodTotals {
    fn collect(orders: &[Order], start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let (count, revenue) = orders
            .iter()
            .filter(|order| order.order_date >= start && order.order_date < end)
            .fold((0usize, 0.0f64), |(count, revenue), order| (count + 1, revenue + order.value()));

        Self {
            start,
            end,
            orders: count,
            revenue,
        }
    }

    fn empty(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: at,
            orders: 0,
            revenue: 0.0,
        }
    }
}

/// Period-over-period growth between two adjacent trailing windows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodGrowth {
    #[serde(rename = "orderGrowth")]
    pub order_growth_pct: f64,
    #[serde(rename = "revenueGrowth")]
    pub revenue_growth_pct: f64,
    pub current_period: PeriodTotals,
    pub previous_period: PeriodTotals,
}

/// Compare `[now - w, now)` against `[now - 2w, now - w)`.
/// A previous period with nothing in it yields 0% growth. A window that is
/// not positive or reaches past the representable calendar yields two empty
/// periods at `now`.
pub fn compute_period_growth(orders: &[Order], now: DateTime<Utc>, window_days: i64) -> PeriodGrowth {
    let bounds = Duration::try_days(window_days)
        .filter(|_| window_days > 0)
        .and_then(|window| {
            let current_start = now.checked_sub_signed(window)?;
            let previous_start = current_start.checked_sub_signed(window)?;
            Some((previous_start, current_start))
        });

    let Some((previous_start, current_start)) = bounds else {
        tracing::warn!(window_days, "Growth window out of range, reporting empty periods");
        return PeriodGrowth {
            order_growth_pct: 0.0,
            revenue_growth_pct: 0.0,
            current_period: PeriodTotals::empty(now),
            previous_period: PeriodTotals::empty(now),
        };
    };

    let current_period = PeriodTotals::collect(orders, current_start, now);
    let previous_period = PeriodTotals::collect(orders, previous_start, current_start);

    PeriodGrowth {
        order_growth_pct: growth_pct(
            current_period.orders as f64,
            previous_period.orders as f64,
            GROWTH_DECIMALS,
        ),
        revenue_growth_pct: growth_pct(current_period.revenue, previous_period.revenue, GROWTH_DECIMALS),
        current_period,
        previous_period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn placed(id: i64, days_ago: i64, total: f64) -> Order {
        Order::new_pending(id, id, now() - Duration::days(days_ago)).with_total(total)
    }

    #[test]
    fn test_growth_between_windows() {
        let orders = vec![
            placed(1, 5, 100.0),
            placed(2, 10, 50.0),
            placed(3, 40, 100.0),
        ];
        let growth = compute_period_growth(&orders, now(), 30);

        assert_eq!(growth.current_period.orders, 2);
        assert_eq!(growth.previous_period.orders, 1);
        assert_eq!(growth.order_growth_pct, 100.0);
        assert_eq!(growth.revenue_growth_pct, 50.0);
    }

    #[test]
    fn test_zero_baseline_gives_zero_growth() {
        let orders = vec![placed(1, 1, 100.0)];
        let growth = compute_period_growth(&orders, now(), 30);
        assert_eq!(growth.order_growth_pct, 0.0);
        assert_eq!(growth.revenue_growth_pct, 0.0);

        // orders in the previous window but worth nothing
        let orders = vec![placed(1, 1, 100.0), Order::new_pending(2, 2, now() - Duration::days(45))];
        let growth = compute_period_growth(&orders, now(), 30);
        assert_eq!(growth.order_growth_pct, 0.0);
        assert_eq!(growth.revenue_growth_pct, 0.0);
        assert!(growth.revenue_growth_pct.is_finite());
    }

    #[test]
    fn test_window_boundaries() {
        // exactly now - 30d belongs to the current window, exactly now does not
        let orders = vec![
            placed(1, 30, 10.0),
            Order::new_pending(2, 2, now()).with_total(10.0),
            placed(3, 60, 10.0),
        ];
        let growth = compute_period_growth(&orders, now(), 30);
        assert_eq!(growth.current_period.orders, 1);
        assert_eq!(growth.previous_period.orders, 1);
    }

    #[test]
    fn test_growth_is_rounded_to_two_decimals() {
        let orders = vec![placed(1, 1, 10.0), placed(2, 35, 10.0), placed(3, 36, 10.0), placed(4, 37, 10.0)];
        let growth = compute_period_growth(&orders, now(), 30);
        assert_eq!(growth.order_growth_pct, -66.67);
    }

    #[test]
    fn test_out_of_range_window_gives_empty_periods() {
        let orders = vec![placed(1, 5, 100.0), placed(2, 40, 50.0)];

        for window_days in [1_000_000_000, i64::MAX, 0, -30] {
            let growth = compute_period_growth(&orders, now(), window_days);
            assert_eq!(growth.order_growth_pct, 0.0);
            assert_eq!(growth.revenue_growth_pct, 0.0);
            assert_eq!(growth.current_period.orders, 0);
            assert_eq!(growth.previous_period.start, now());
        }

        // wide but representable windows still count
        let growth = compute_period_growth(&orders, now(), 36_500);
        assert_eq!(growth.current_period.orders, 2);
    }

    #[test]
    fn test_growth_serializes_dashboard_field_names() {
        let json = serde_json::to_value(compute_period_growth(&[], now(), 30)).unwrap();
        assert_eq!(json["orderGrowth"], serde_json::json!(0.0));
        assert!(json.get("currentPeriod").is_some());
    }
}
