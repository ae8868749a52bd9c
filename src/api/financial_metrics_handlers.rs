use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::database::models::{FinancialMetrics, FinancialMetricsChanges, NewFinancialMetrics};
use crate::database::repositories::RepositoryError;

use super::handlers::{run_blocking, AppState};
use super::responses::*;

// ============================================================================
// Financial Metrics Endpoints
// ============================================================================

/// List all financial metrics
#[utoipa::path(
    get,
    path = "/api/v1/financial-metrics",
    tag = "financial-metrics",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of financial metrics in id order", body = Vec<FinancialMetrics>),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_financial_metrics(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<FinancialMetrics>>, RepositoryError> {
    let repo = state.financial_metrics.clone();
    let page = params.page();

    run_blocking(move || repo.list(page)).await.map(Json)
}

/// Get financial metrics by ID
#[utoipa::path(
    get,
    path = "/api/v1/financial-metrics/{metrics_id}",
    tag = "financial-metrics",
    params(
        ("metrics_id" = i32, Path, description = "Financial metrics ID")
    ),
    responses(
        (status = 200, description = "Financial metrics details", body = FinancialMetrics),
        (status = 404, description = "Financial metrics not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_financial_metrics(
    State(state): State<AppState>,
    Path(metrics_id): Path<i32>,
) -> Result<Json<FinancialMetrics>, RepositoryError> {
    let repo = state.financial_metrics.clone();

    run_blocking(move || repo.find_by_id(metrics_id))
        .await
        .map(Json)
}

/// List financial metrics of one company, most recent period first
#[utoipa::path(
    get,
    path = "/api/v1/financial-metrics/company/{company_id}",
    tag = "financial-metrics",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Financial metrics ordered by period end descending", body = Vec<FinancialMetrics>),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_company_financial_metrics(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<FinancialMetrics>>, RepositoryError> {
    let repo = state.financial_metrics.clone();
    let page = params.page();

    run_blocking(move || repo.list_by_company(company_id, page))
        .await
        .map(Json)
}

/// Record financial metrics for a company period
#[utoipa::path(
    post,
    path = "/api/v1/financial-metrics",
    tag = "financial-metrics",
    request_body = NewFinancialMetrics,
    responses(
        (status = 201, description = "Financial metrics created", body = FinancialMetrics),
        (status = 400, description = "Period already recorded or unknown company", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_financial_metrics(
    State(state): State<AppState>,
    Json(new_metrics): Json<NewFinancialMetrics>,
) -> Result<(StatusCode, Json<FinancialMetrics>), RepositoryError> {
    let repo = state.financial_metrics.clone();

    let metrics = run_blocking(move || repo.create(new_metrics)).await?;
    Ok((StatusCode::CREATED, Json(metrics)))
}

/// Partially update financial metrics
#[utoipa::path(
    put,
    path = "/api/v1/financial-metrics/{metrics_id}",
    tag = "financial-metrics",
    params(
        ("metrics_id" = i32, Path, description = "Financial metrics ID")
    ),
    request_body = FinancialMetricsChanges,
    responses(
        (status = 200, description = "Updated financial metrics", body = FinancialMetrics),
        (status = 400, description = "Period already recorded", body = ErrorResponse),
        (status = 404, description = "Financial metrics not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_financial_metrics(
    State(state): State<AppState>,
    Path(metrics_id): Path<i32>,
    Json(changes): Json<FinancialMetricsChanges>,
) -> Result<Json<FinancialMetrics>, RepositoryError> {
    let repo = state.financial_metrics.clone();

    run_blocking(move || repo.update(metrics_id, changes))
        .await
        .map(Json)
}

/// Delete financial metrics
#[utoipa::path(
    delete,
    path = "/api/v1/financial-metrics/{metrics_id}",
    tag = "financial-metrics",
    params(
        ("metrics_id" = i32, Path, description = "Financial metrics ID")
    ),
    responses(
        (status = 204, description = "Financial metrics deleted"),
        (status = 404, description = "Financial metrics not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_financial_metrics(
    State(state): State<AppState>,
    Path(metrics_id): Path<i32>,
) -> Result<StatusCode, RepositoryError> {
    let repo = state.financial_metrics.clone();

    run_blocking(move || repo.delete(metrics_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
