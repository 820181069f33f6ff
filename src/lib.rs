//! Order lifecycle rules, timestamp repair and dashboard aggregation for the
//! toy-store back office.

pub mod analytics;
pub mod config;
pub mod domain;
pub mod geo;
pub mod metrics;
pub mod ops;
pub mod store;
pub mod utils;
