// ============================================================================
// Analytics - dashboard aggregations over an order snapshot
// ============================================================================
//
// Pure functions: no I/O, no clock reads. `now` is always passed in.
//
// ============================================================================

pub mod breakdown;
pub mod dashboard;
pub mod geography;
pub mod growth;
pub mod numeric;
pub mod reports;
pub mod segments;
pub mod series;
pub mod snapshot;
pub mod summary;

pub use breakdown::*;
pub use dashboard::*;
pub use geography::*;
pub use growth::*;
pub use numeric::*;
pub use reports::*;
pub use segments::*;
pub use series::*;
pub use snapshot::*;
pub use summary::*;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::order::{Order, OrderStatus};
    use chrono::{TimeZone, Utc};

    /// 2024-01-10 $100 delivered, 2024-02-15 $50 pending, 2024-02-20 $150 shipped
    pub fn three_orders() -> Vec<Order> {
        let at = |month, day| Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap();

        let mut delivered = Order::new_pending(1, 1, at(1, 10)).with_total(100.0);
        delivered.status = OrderStatus::Delivered;
        delivered.processing_date = Some(at(1, 11));
        delivered.shipped_date = Some(at(1, 12));
        delivered.delivery_date = Some(at(1, 15));

        let pending = Order::new_pending(2, 2, at(2, 15)).with_total(50.0);

        let mut shipped = Order::new_pending(3, 1, at(2, 20)).with_total(150.0);
        shipped.status = OrderStatus::Shipped;
        shipped.processing_date = Some(at(2, 21));
        shipped.shipped_date = Some(at(2, 22));

        vec![delivered, pending, shipped]
    }
}
