use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::database::models::{Company, CompanyChanges, NewCompany};
use crate::database::repositories::RepositoryError;

use super::handlers::{error_response, run_blocking, AppState};
use super::responses::*;

// ============================================================================
// Company Endpoints
// ============================================================================

/// List companies
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "companies",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of companies in id order", body = Vec<Company>),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<Company>>, RepositoryError> {
    let repo = state.companies.clone();
    let page = params.page();

    run_blocking(move || repo.list(page)).await.map(Json)
}

/// Get company by ID
#[utoipa::path(
    get,
    path = "/api/v1/companies/{company_id}",
    tag = "companies",
    params(
        ("company_id" = i32, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company details", body = Company),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
) -> Result<Json<Company>, RepositoryError> {
    let repo = state.companies.clone();

    run_blocking(move || repo.find_by_id(company_id))
        .await
        .map(Json)
}

/// Get company by ticker (case-insensitive)
#[utoipa::path(
    get,
    path = "/api/v1/companies/ticker/{ticker}",
    tag = "companies",
    params(
        ("ticker" = String, Path, description = "Ticker symbol (e.g., AAPL)")
    ),
    responses(
        (status = 200, description = "Company details", body = Company),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_company_by_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Response, RepositoryError> {
    let repo = state.companies.clone();
    let lookup = ticker.clone();

    match run_blocking(move || repo.find_by_ticker(&lookup)).await? {
        Some(company) => Ok(Json(company).into_response()),
        None => Ok(error_response(
            StatusCode::NOT_FOUND,
            format!("Company with ticker {} not found", ticker),
        )),
    }
}

/// Create a company
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    tag = "companies",
    request_body = NewCompany,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Name or ticker already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_company(
    State(state): State<AppState>,
    Json(new_company): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), RepositoryError> {
    let repo = state.companies.clone();

    let company = run_blocking(move || repo.create(new_company)).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// Partially update a company
#[utoipa::path(
    put,
    path = "/api/v1/companies/{company_id}",
    tag = "companies",
    params(
        ("company_id" = i32, Path, description = "Company ID")
    ),
    request_body = CompanyChanges,
    responses(
        (status = 200, description = "Updated company", body = Company),
        (status = 400, description = "Name or ticker already exists", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
    Json(changes): Json<CompanyChanges>,
) -> Result<Json<Company>, RepositoryError> {
    let repo = state.companies.clone();

    run_blocking(move || repo.update(company_id, changes))
        .await
        .map(Json)
}

/// Delete a company and all of its financial metrics
#[utoipa::path(
    delete,
    path = "/api/v1/companies/{company_id}",
    tag = "companies",
    params(
        ("company_id" = i32, Path, description = "Company ID")
    ),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
) -> Result<StatusCode, RepositoryError> {
    let repo = state.companies.clone();

    run_blocking(move || repo.delete(company_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
