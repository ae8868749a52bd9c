use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::company_handlers::*;
use super::financial_metrics_handlers::*;
use super::handlers::{health_check, root, test_config, AppState};
use super::openapi::ApiDoc;

/// Versioned path prefix for resource endpoints
pub const API_V1_PREFIX: &str = "/api/v1";

/// Location of the generated OpenAPI document
pub const OPENAPI_PATH: &str = "/api/v1/openapi.json";

/// Create the API router with Swagger UI
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api = Router::new()
        // Company endpoints
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/:company_id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/companies/ticker/:ticker", get(get_company_by_ticker))
        // Financial metrics endpoints
        .route(
            "/financial-metrics",
            get(list_financial_metrics).post(create_financial_metrics),
        )
        .route(
            "/financial-metrics/:metrics_id",
            get(get_financial_metrics)
                .put(update_financial_metrics)
                .delete(delete_financial_metrics),
        )
        .route(
            "/financial-metrics/company/:company_id",
            get(list_company_financial_metrics),
        )
        // Diagnostics (debug mode only)
        .route("/test-config", get(test_config));

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(API_V1_PREFIX, api)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(layer) => router.layer(layer),
        None => router,
    }
}

/// CORS layer for the configured origins; `None` when no origin is configured
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return None;
    }

    tracing::info!("CORS enabled for {} origin(s)", allowed.len());

    // Credentials rule out wildcards, so methods and headers mirror the request
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}
