use company_financials_api::database::{establish_connection_pool, seed_sample_data, DatabasePool};
use company_financials_api::{create_router, AppConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "company_financials_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let seed = config.seed_sample_data;

    // PostgreSQL when configured and reachable, in-memory store otherwise
    let state = match initialize_database(&config).await {
        Some(pool) => AppState::postgres(pool, config),
        None => {
            tracing::warn!("⚠️  Using in-memory store, data will not survive a restart");
            AppState::in_memory(config)
        }
    };

    if seed {
        seed_store(&state).await;
    }

    let storage = state.storage;
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Company Financials API running on http://{}", bind_addr);
    tracing::info!("🗄️  Storage: {}", storage);
    tracing::info!("📊 Health check: http://{}/health", bind_addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}

/// Connect to PostgreSQL and apply pending migrations
///
/// Returns `None` when DATABASE_URL is unset or the database cannot be used.
async fn initialize_database(config: &AppConfig) -> Option<DatabasePool> {
    let database_url = config.database_url.clone()?;
    let pool_size = config.pool_max_size;
    let run_migrations = config.run_migrations;

    tracing::info!("🗄️  Initializing PostgreSQL connection...");

    let result = tokio::task::spawn_blocking(move || {
        let pool = establish_connection_pool(&database_url, pool_size)?;
        if run_migrations {
            let applied = pool.run_migrations()?;
            tracing::info!("✅ Applied {} pending migration(s)", applied);
        }
        Ok::<_, company_financials_api::database::DatabaseError>(pool)
    })
    .await;

    match result {
        Ok(Ok(pool)) => {
            tracing::info!("✅ Database connection established successfully");
            Some(pool)
        }
        Ok(Err(e)) => {
            tracing::error!("❌ Failed to initialize database: {}", e);
            None
        }
        Err(e) => {
            tracing::error!("❌ Database initialization task failed: {}", e);
            None
        }
    }
}

/// Insert sample companies and metrics into an empty store
async fn seed_store(state: &AppState) {
    let companies = state.companies.clone();
    let financial_metrics = state.financial_metrics.clone();

    let result = tokio::task::spawn_blocking(move || {
        seed_sample_data(companies.as_ref(), financial_metrics.as_ref())
    })
    .await;

    match result {
        Ok(Ok(summary)) => tracing::info!(
            "🌱 Seeded {} companies and {} financial metrics",
            summary.companies,
            summary.financial_metrics
        ),
        Ok(Err(e)) => tracing::error!("❌ Failed to seed sample data: {}", e),
        Err(e) => tracing::error!("❌ Seed task failed: {}", e),
    }
}
