use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::repositories::Page;

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Pagination query parameters shared by list endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Number of records to skip (default 0)
    pub skip: Option<u32>,
    /// Maximum number of records to return (default 100, at most 1000)
    pub limit: Option<u32>,
}

impl PaginationParams {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

/// Welcome document served at `/`
#[derive(Debug, Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
    pub docs_url: String,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub timestamp: String,
}
