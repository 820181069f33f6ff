// ============================================================================
// Customer Domain
// ============================================================================

pub mod model;
pub mod value_objects;

pub use model::*;
pub use value_objects::*;
