// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Orders own the lifecycle/timestamp invariants. Customers are read-only
// here: identity plus the segment derived from their orders.
//
// ============================================================================

pub mod order;
pub mod customer;
