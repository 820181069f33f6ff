// ============================================================================
// Order Store - persistence behind the `OrderRepository` seam
// ============================================================================
//
// Repositories hand out raw `OrderRecord`s; validation happens when the
// records are turned into an `OrderSnapshot`. Callers receive an
// `Arc<dyn OrderRepository>` and never reach for a global connection.
//
// ============================================================================

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::{InMemoryOrderRepository, SnapshotFile};
pub use postgres::PgOrderRepository;
pub use repository::{LoadedOrders, OrderFilter, OrderRepository, RepositoryError};
