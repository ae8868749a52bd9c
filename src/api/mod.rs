pub mod company_handlers;
pub mod financial_metrics_handlers;
pub mod handlers;
pub mod openapi;
pub mod responses;
pub mod routes;

pub use handlers::{AppState, StorageBackend};
pub use openapi::ApiDoc;
pub use responses::*;
pub use routes::create_router;
