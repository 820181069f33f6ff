use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::model::Order;
use super::value_objects::LifecycleStage;

// ============================================================================
// Timestamp Repair - batch/maintenance backfill
// ============================================================================
//
// Walks the timestamps a status requires in causal order. A missing or
// out-of-order timestamp is rebuilt as "previous + random delay", capped at
// `now` and at the next valid timestamp already on the order. The result
// always satisfies `check_lifecycle` and repairing it again changes nothing.
//
// Randomness is injected so maintenance runs are reproducible.
//
// ============================================================================

/// Inclusive range of whole days between two lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayWindow {
    pub min_days: i64,
    pub max_days: i64,
}

impl DelayWindow {
    pub const fn days(min_days: i64, max_days: i64) -> Self {
        Self { min_days, max_days }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = self.min_days.min(self.max_days).max(0);
        let high = self.min_days.max(self.max_days).max(0);
        Duration::days(rng.gen_range(low..=high))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairPolicy {
    /// order date -> processing
    pub processing: DelayWindow,
    /// processing -> shipped
    pub shipping: DelayWindow,
    /// shipped -> delivered
    pub delivery: DelayWindow,
    /// How far before `now` a future order date is moved
    pub future_order_rewind: Duration,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            processing: DelayWindow::days(1, 3),
            shipping: DelayWindow::days(1, 3),
            delivery: DelayWindow::days(2, 5),
            future_order_rewind: Duration::days(365),
        }
    }
}

impl RepairPolicy {
    pub fn delay_for(&self, stage: LifecycleStage) -> DelayWindow {
        match stage {
            LifecycleStage::Processing => self.processing,
            LifecycleStage::Shipped => self.shipping,
            LifecycleStage::Delivered => self.delivery,
        }
    }
}

/// Produce a copy of `order` whose timestamps satisfy the lifecycle
/// invariants at `now`. The status is never changed.
pub fn repair_order<R: Rng + ?Sized>(
    order: &Order,
    now: DateTime<Utc>,
    policy: &RepairPolicy,
    rng: &mut R,
) -> Order {
    let mut repaired = order.clone();

    if repaired.order_date > now {
        repaired.order_date = now - policy.future_order_rewind;
    }

    let required = order.required_stages();

    for stage in LifecycleStage::ALL {
        if !required.contains(&stage) {
            repaired.set_stage_timestamp(stage, None);
        }
    }

    let mut previous = repaired.order_date;

    for (index, stage) in required.iter().copied().enumerate() {
        let floor = previous;
        let valid = |at: DateTime<Utc>| at >= floor && at <= now;

        if let Some(at) = repaired.stage_timestamp(stage) {
            if valid(at) {
                previous = at;
                continue;
            }
        }

        let anchor = required[index + 1..]
            .iter()
            .filter_map(|later| repaired.stage_timestamp(*later))
            .find(|at| valid(*at));

        let mut at = (previous + policy.delay_for(stage).sample(rng)).min(now);
        if let Some(anchor) = anchor {
            at = at.min(anchor);
        }

        repaired.set_stage_timestamp(stage, Some(at));
        previous = at;
    }

    repaired
}

/// Names of the timestamp fields that differ between two versions of an order
pub fn changed_fields(before: &Order, after: &Order) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if before.order_date != after.order_date {
        fields.push("orderDate");
    }
    for stage in LifecycleStage::ALL {
        if before.stage_timestamp(stage) != after.stage_timestamp(stage) {
            fields.push(stage.field_name());
        }
    }
    fields
}

// ============================================================================
// Unit Tests
// ============================================================================
