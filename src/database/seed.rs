//! Sample data for development databases
//!
//! Seeding goes through the repository traits, so it behaves the same
//! against PostgreSQL and the in-memory store.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::database::models::{NewCompany, NewFinancialMetrics};
use crate::database::repositories::{
    CompanyRepository, FinancialMetricsRepository, Page, RepositoryError, RepositoryResult,
};

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub companies: usize,
    pub financial_metrics: usize,
}

fn sample_companies() -> Vec<NewCompany> {
    vec![
        NewCompany::new("Apple Inc.", "AAPL")
            .with_sector("Technology")
            .with_industry("Consumer Electronics")
            .with_description(
                "Apple Inc. designs, manufactures, and markets smartphones, personal computers, \
                 tablets, wearables, and accessories worldwide.",
            )
            .with_website("https://www.apple.com")
            .with_country("USA")
            .with_exchange("NASDAQ")
            .with_currency("USD"),
        NewCompany::new("Microsoft Corporation", "MSFT")
            .with_sector("Technology")
            .with_industry("Software")
            .with_description(
                "Microsoft Corporation develops, licenses, and supports software, services, \
                 devices, and solutions worldwide.",
            )
            .with_website("https://www.microsoft.com")
            .with_country("USA")
            .with_exchange("NASDAQ")
            .with_currency("USD"),
        NewCompany::new("Tesla, Inc.", "TSLA")
            .with_sector("Consumer Discretionary")
            .with_industry("Automobiles")
            .with_description(
                "Tesla, Inc. designs, develops, manufactures, leases, and sells electric \
                 vehicles, and energy generation and storage systems.",
            )
            .with_website("https://www.tesla.com")
            .with_country("USA")
            .with_exchange("NASDAQ")
            .with_currency("USD"),
    ]
}

fn year_end(year: i32) -> RepositoryResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| RepositoryError::Unexpected(format!("invalid period end year {}", year)))
}

fn sample_apple_metrics(company_id: i32) -> RepositoryResult<Vec<NewFinancialMetrics>> {
    let mut fy2023 = NewFinancialMetrics::new(company_id, year_end(2023)?, "annual")
        .with_revenue(dec!(383285000000))
        .with_net_income(dec!(96995000000));
    fy2023.total_assets = Some(dec!(352755000000));
    fy2023.total_equity = Some(dec!(62146000000));
    fy2023.roe = Some(dec!(15.6));
    fy2023.roa = Some(dec!(27.5));
    fy2023.gross_margin = Some(dec!(44.1));
    fy2023.net_margin = Some(dec!(25.3));
    fy2023.pe_ratio = Some(dec!(31.2));

    let mut fy2022 = NewFinancialMetrics::new(company_id, year_end(2022)?, "annual")
        .with_revenue(dec!(394328000000))
        .with_net_income(dec!(96995000000));
    fy2022.total_assets = Some(dec!(346747000000));
    fy2022.total_equity = Some(dec!(50672000000));
    fy2022.roe = Some(dec!(19.1));
    fy2022.roa = Some(dec!(28.0));
    fy2022.gross_margin = Some(dec!(43.3));
    fy2022.net_margin = Some(dec!(24.6));
    fy2022.pe_ratio = Some(dec!(25.8));

    Ok(vec![fy2023, fy2022])
}

/// Insert sample companies and metrics unless the store already holds companies
pub fn seed_sample_data(
    companies: &dyn CompanyRepository,
    financial_metrics: &dyn FinancialMetricsRepository,
) -> RepositoryResult<SeedSummary> {
    if !companies.list(Page::new(None, Some(1)))?.is_empty() {
        tracing::info!("Store already contains companies, skipping seed");
        return Ok(SeedSummary::default());
    }

    tracing::info!("Seeding store with sample data...");
    let mut summary = SeedSummary::default();

    for new_company in sample_companies() {
        companies.create(new_company)?;
        summary.companies += 1;
    }

    if let Some(apple) = companies.find_by_ticker("AAPL")? {
        for new_metrics in sample_apple_metrics(apple.id)? {
            financial_metrics.create(new_metrics)?;
            summary.financial_metrics += 1;
        }
    }

    tracing::info!(
        "Seeded {} companies and {} financial metrics rows",
        summary.companies,
        summary.financial_metrics
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::InMemoryStore;

    #[test]
    fn test_seed_populates_empty_store() {
        let store = InMemoryStore::new();

        let summary = seed_sample_data(&store, &store).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                companies: 3,
                financial_metrics: 2
            }
        );

        let apple = CompanyRepository::find_by_ticker(&store, "AAPL")
            .unwrap()
            .unwrap();
        let rows = FinancialMetricsRepository::list_by_company(&store, apple.id, Page::default())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period_end, year_end(2023).unwrap());
        assert_eq!(rows[0].revenue, Some(dec!(383285000000)));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = InMemoryStore::new();
        seed_sample_data(&store, &store).unwrap();

        let second = seed_sample_data(&store, &store).unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(
            CompanyRepository::list(&store, Page::default()).unwrap().len(),
            3
        );
    }
}
