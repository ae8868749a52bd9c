// Library Crate Root
// lib.rs

// main.rs and the integration tests import through lib.rs like an external crate
pub mod api;
pub mod config;
pub mod database;

// pub use = re-export at crate root
pub use api::{create_router, AppState, StorageBackend};
pub use config::AppConfig;
pub use database::repositories::{RepositoryError, RepositoryResult};
