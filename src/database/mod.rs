/// Database module for company and financial metrics persistence
///
/// This module provides:
/// - Connection pooling and embedded migrations for PostgreSQL
/// - Repository traits with PostgreSQL and in-memory implementations
/// - Database models and schema
/// - Sample data seeding

pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod seed;

pub use connection::{establish_connection_pool, DatabaseError, DatabasePool};
pub use seed::{seed_sample_data, SeedSummary};
