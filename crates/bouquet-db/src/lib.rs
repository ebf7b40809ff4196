//! Storage layer for bouquet: plan records, configuration, pooling and queries.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;
