use utoipa::OpenApi;

use crate::api::responses::*;
use crate::api::{company_handlers, financial_metrics_handlers, handlers};
use crate::database::models::{
    Company, CompanyChanges, FinancialMetrics, FinancialMetricsChanges, NewCompany,
    NewFinancialMetrics,
};

/// OpenAPI v1 specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Company Financials API",
        version = "1.0.0",
        description = "CRUD API for companies and their periodic financial metrics",
        license(
            name = "MIT"
        )
    ),
    paths(
        handlers::root,
        handlers::health_check,
        handlers::test_config,
        company_handlers::list_companies,
        company_handlers::get_company,
        company_handlers::get_company_by_ticker,
        company_handlers::create_company,
        company_handlers::update_company,
        company_handlers::delete_company,
        financial_metrics_handlers::list_financial_metrics,
        financial_metrics_handlers::get_financial_metrics,
        financial_metrics_handlers::list_company_financial_metrics,
        financial_metrics_handlers::create_financial_metrics,
        financial_metrics_handlers::update_financial_metrics,
        financial_metrics_handlers::delete_financial_metrics,
    ),
    components(
        schemas(
            Company,
            NewCompany,
            CompanyChanges,
            FinancialMetrics,
            NewFinancialMetrics,
            FinancialMetricsChanges,
            ErrorResponse,
            WelcomeResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "companies", description = "Company management endpoints"),
        (name = "financial-metrics", description = "Financial metrics endpoints"),
    )
)]
pub struct ApiDoc;
