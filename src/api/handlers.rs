use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::repositories::{
    CompanyRepository, CompanyRepositoryImpl, FinancialMetricsRepository,
    FinancialMetricsRepositoryImpl, InMemoryStore, RepositoryError, RepositoryResult,
};
use crate::database::DatabasePool;

use super::responses::*;

/// Which store backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    InMemory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => write!(f, "postgres"),
            StorageBackend::InMemory => write!(f, "in-memory"),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub companies: Arc<dyn CompanyRepository>,
    pub financial_metrics: Arc<dyn FinancialMetricsRepository>,
    pub config: Arc<AppConfig>,
    pub storage: StorageBackend,
}

impl AppState {
    /// Repositories backed by the PostgreSQL pool
    pub fn postgres(pool: DatabasePool, config: AppConfig) -> Self {
        let pool_clone = pool.clone();
        let companies = Arc::new(CompanyRepositoryImpl::new(move || pool_clone.get_conn()))
            as Arc<dyn CompanyRepository>;

        let financial_metrics =
            Arc::new(FinancialMetricsRepositoryImpl::new(move || pool.get_conn()))
                as Arc<dyn FinancialMetricsRepository>;

        Self {
            companies,
            financial_metrics,
            config: Arc::new(config),
            storage: StorageBackend::Postgres,
        }
    }

    /// Repositories backed by one in-process store
    pub fn in_memory(config: AppConfig) -> Self {
        let store = InMemoryStore::new();

        Self {
            companies: Arc::new(store.clone()),
            financial_metrics: Arc::new(store),
            config: Arc::new(config),
            storage: StorageBackend::InMemory,
        }
    }
}

/// Build a JSON error body with the given status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        error: status.to_string(),
        message: message.into(),
    });

    (status, body).into_response()
}

/// Convert RepositoryError to HTTP response
impl IntoResponse for RepositoryError {
    fn into_response(self) -> Response {
        match &self {
            RepositoryError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, self.to_string()),
            RepositoryError::Duplicate(_) | RepositoryError::ConstraintViolation(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            RepositoryError::Unexpected(_) => {
                tracing::error!("Request failed: {}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Run a blocking repository call off the async runtime
pub async fn run_blocking<T, F>(task: F) -> RepositoryResult<T>
where
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| RepositoryError::Unexpected(format!("repository task failed: {}", e)))?
}

/// Welcome document
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service information", body = WelcomeResponse)
    )
)]
pub async fn root(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to {} API", state.config.project_name),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs_url: "/swagger-ui".to_string(),
    })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        storage: state.storage.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Report which settings are configured (debug mode only)
#[utoipa::path(
    get,
    path = "/api/v1/test-config",
    tag = "Health",
    responses(
        (status = 200, description = "Configuration status"),
        (status = 403, description = "Not in debug mode", body = ErrorResponse)
    )
)]
pub async fn test_config(State(state): State<AppState>) -> Response {
    if !state.config.debug {
        return error_response(
            StatusCode::FORBIDDEN,
            "This endpoint is only available in debug mode",
        );
    }

    let database_status = if state.config.database_url.is_some() {
        "✓"
    } else {
        "✗ (optional, using in-memory store)"
    };

    Json(serde_json::json!({
        "optional_settings": {
            "DATABASE_URL": database_status,
        },
        "storage": state.storage.to_string(),
        "environment": &*state.config,
    }))
    .into_response()
}
