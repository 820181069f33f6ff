// ============================================================================
// Order Domain - lifecycle rules for a single order
// ============================================================================
//
// - Value objects (OrderStatus, LifecycleStage, LineItem, DeliveryAddress)
// - Model (Order, and the raw OrderRecord it is validated from)
// - Lifecycle (status transitions, invariant checks)
// - Repair (timestamp backfill for maintenance passes)
// - Errors (OrderError)
//
// Everything here is pure: no I/O, no clock, no global randomness.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod model;
pub mod lifecycle;
pub mod repair;

pub use value_objects::*;
pub use errors::*;
pub use model::*;
pub use lifecycle::*;
pub use repair::*;
