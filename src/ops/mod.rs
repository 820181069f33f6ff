// ============================================================================
// Operations - repository-backed workflows
// ============================================================================
//
// Glue between the pure domain/analytics code and an `OrderRepository`:
// - maintenance: repair or verify lifecycle timestamps across all orders
// - transition: move one order to a new status and persist it
// - dashboard: load a snapshot and build the dashboard report
// - reports: customer and order-range reports
//
// ============================================================================

pub mod dashboard;
pub mod maintenance;
pub mod reports;
pub mod transition;

pub use dashboard::load_dashboard;
pub use maintenance::{MaintenanceMode, MaintenanceOptions, MaintenanceReport, MaintenanceRunner};
pub use reports::{load_customer_report, load_order_report};
pub use transition::{transition_order, TransitionError};
