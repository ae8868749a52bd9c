use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::database::models::{
    Company, CompanyChanges, FinancialMetrics, FinancialMetricsChanges, NewCompany,
    NewFinancialMetrics,
};

use super::company_repository::{
    conflicts_with, duplicate_company_error, same_identity, validate_company_changes,
    validate_new_company, CompanyRepository,
};
use super::error::{RepositoryError, RepositoryResult};
use super::financial_metrics_repository::{
    duplicate_metrics_error, occupies_period, validate_period_type, FinancialMetricsRepository,
};
use super::Page;

#[derive(Debug)]
struct Tables {
    companies: BTreeMap<i32, Company>,
    financial_metrics: BTreeMap<i32, FinancialMetrics>,
    next_company_id: i32,
    next_metrics_id: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            companies: BTreeMap::new(),
            financial_metrics: BTreeMap::new(),
            next_company_id: 1,
            next_metrics_id: 1,
        }
    }
}

impl Tables {
    fn company_conflict(
        &self,
        name: &str,
        ticker: &str,
        exclude_id: Option<i32>,
    ) -> Option<&Company> {
        self.companies
            .values()
            .filter(|c| Some(c.id) != exclude_id)
            .find(|c| conflicts_with(c, name, ticker))
    }

    fn period_taken(
        &self,
        company_id: i32,
        period_end: NaiveDate,
        period_type: &str,
        exclude_id: Option<i32>,
    ) -> bool {
        self.financial_metrics
            .values()
            .filter(|m| Some(m.id) != exclude_id)
            .any(|m| occupies_period(m, company_id, period_end, period_type))
    }
}

/// In-process store for companies and financial metrics
///
/// Used when no database is configured. Enforces the same uniqueness,
/// foreign-key and cascade rules as the PostgreSQL schema; every operation
/// holds the table lock for its whole check-and-write, so concurrent callers
/// cannot slip a duplicate between the check and the insert. Ids come from
/// per-store sequences.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompanyRepository for InMemoryStore {
    fn create(&self, new_company: NewCompany) -> RepositoryResult<Company> {
        validate_new_company(&new_company)?;
        let mut tables = self.tables.write();

        if let Some(existing) = tables.company_conflict(&new_company.name, &new_company.ticker, None)
        {
            tracing::warn!(
                "Rejected company {} ({}): conflicts with company {}",
                new_company.name,
                new_company.ticker,
                existing.id
            );
            return Err(duplicate_company_error(existing, &new_company.name));
        }

        let id = tables.next_company_id;
        tables.next_company_id += 1;

        let now = Utc::now();
        let currency = new_company.effective_currency().to_string();
        let company = Company {
            id,
            name: new_company.name,
            ticker: new_company.ticker,
            sector: new_company.sector,
            industry: new_company.industry,
            description: new_company.description,
            website: new_company.website,
            country: new_company.country,
            exchange: new_company.exchange,
            currency,
            created_at: now,
            updated_at: now,
            is_active: true,
            last_data_update: None,
        };

        tables.companies.insert(id, company.clone());
        tracing::info!("Created company {} ({})", company.id, company.ticker);
        Ok(company)
    }

    fn find_by_id(&self, company_id: i32) -> RepositoryResult<Company> {
        self.tables
            .read()
            .companies
            .get(&company_id)
            .cloned()
            .ok_or_else(|| RepositoryError::company_not_found(company_id))
    }

    fn find_by_ticker(&self, ticker: &str) -> RepositoryResult<Option<Company>> {
        Ok(self
            .tables
            .read()
            .companies
            .values()
            .find(|c| same_identity(&c.ticker, ticker))
            .cloned())
    }

    fn list(&self, page: Page) -> RepositoryResult<Vec<Company>> {
        let tables = self.tables.read();
        Ok(page.slice(tables.companies.values().cloned()))
    }

    fn update(&self, company_id: i32, changes: CompanyChanges) -> RepositoryResult<Company> {
        validate_company_changes(&changes)?;
        let mut tables = self.tables.write();

        let current = tables
            .companies
            .get(&company_id)
            .ok_or_else(|| RepositoryError::company_not_found(company_id))?;

        if changes.touches_identity() {
            let name = changes.name.as_deref().unwrap_or(&current.name);
            let ticker = changes.ticker.as_deref().unwrap_or(&current.ticker);

            if let Some(existing) = tables.company_conflict(name, ticker, Some(company_id)) {
                tracing::warn!(
                    "Rejected update of company {}: conflicts with company {}",
                    company_id,
                    existing.id
                );
                return Err(duplicate_company_error(existing, name));
            }
        }

        let company = tables
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| RepositoryError::company_not_found(company_id))?;
        changes.apply_to(company);
        company.updated_at = Utc::now();

        tracing::debug!("Updated company {}", company_id);
        Ok(company.clone())
    }

    fn delete(&self, company_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();

        if tables.companies.remove(&company_id).is_none() {
            return Err(RepositoryError::company_not_found(company_id));
        }

        let before = tables.financial_metrics.len();
        tables
            .financial_metrics
            .retain(|_, m| m.company_id != company_id);

        tracing::info!(
            "Deleted company {} and {} financial metrics rows",
            company_id,
            before - tables.financial_metrics.len()
        );
        Ok(())
    }

    fn is_unique(
        &self,
        name: &str,
        ticker: &str,
        exclude_id: Option<i32>,
    ) -> RepositoryResult<bool> {
        Ok(self
            .tables
            .read()
            .company_conflict(name, ticker, exclude_id)
            .is_none())
    }
}

impl FinancialMetricsRepository for InMemoryStore {
    fn create(&self, new_metrics: NewFinancialMetrics) -> RepositoryResult<FinancialMetrics> {
        validate_period_type(&new_metrics.period_type)?;
        let mut tables = self.tables.write();

        if !tables.companies.contains_key(&new_metrics.company_id) {
            return Err(RepositoryError::unknown_company(new_metrics.company_id));
        }

        if tables.period_taken(
            new_metrics.company_id,
            new_metrics.period_end,
            &new_metrics.period_type,
            None,
        ) {
            tracing::warn!(
                "Rejected metrics for company {} ({} {}): period already recorded",
                new_metrics.company_id,
                new_metrics.period_type,
                new_metrics.period_end
            );
            return Err(duplicate_metrics_error());
        }

        let id = tables.next_metrics_id;
        tables.next_metrics_id += 1;

        let metrics = new_metrics.into_record(id, Utc::now());
        tables.financial_metrics.insert(id, metrics.clone());

        tracing::info!(
            "Created financial metrics {} for company {}",
            metrics.id,
            metrics.company_id
        );
        Ok(metrics)
    }

    fn find_by_id(&self, metrics_id: i32) -> RepositoryResult<FinancialMetrics> {
        self.tables
            .read()
            .financial_metrics
            .get(&metrics_id)
            .cloned()
            .ok_or_else(|| RepositoryError::metrics_not_found(metrics_id))
    }

    fn list(&self, page: Page) -> RepositoryResult<Vec<FinancialMetrics>> {
        let tables = self.tables.read();
        Ok(page.slice(tables.financial_metrics.values().cloned()))
    }

    fn list_by_company(
        &self,
        company_id: i32,
        page: Page,
    ) -> RepositoryResult<Vec<FinancialMetrics>> {
        let tables = self.tables.read();

        let mut rows: Vec<FinancialMetrics> = tables
            .financial_metrics
            .values()
            .filter(|m| m.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.period_end.cmp(&a.period_end).then(a.id.cmp(&b.id)));

        Ok(page.slice(rows))
    }

    fn update(
        &self,
        metrics_id: i32,
        changes: FinancialMetricsChanges,
    ) -> RepositoryResult<FinancialMetrics> {
        if let Some(period_type) = &changes.period_type {
            validate_period_type(period_type)?;
        }
        let mut tables = self.tables.write();

        let current = tables
            .financial_metrics
            .get(&metrics_id)
            .ok_or_else(|| RepositoryError::metrics_not_found(metrics_id))?;

        if changes.touches_period_key() {
            let period_end = changes.period_end.unwrap_or(current.period_end);
            let period_type = changes
                .period_type
                .as_deref()
                .unwrap_or(&current.period_type);

            if tables.period_taken(current.company_id, period_end, period_type, Some(metrics_id)) {
                return Err(duplicate_metrics_error());
            }
        }

        let metrics = tables
            .financial_metrics
            .get_mut(&metrics_id)
            .ok_or_else(|| RepositoryError::metrics_not_found(metrics_id))?;
        changes.apply_to(metrics);
        metrics.updated_at = Utc::now();

        tracing::debug!("Updated financial metrics {}", metrics_id);
        Ok(metrics.clone())
    }

    fn delete(&self, metrics_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();

        if tables.financial_metrics.remove(&metrics_id).is_none() {
            return Err(RepositoryError::metrics_not_found(metrics_id));
        }

        tracing::info!("Deleted financial metrics {}", metrics_id);
        Ok(())
    }

    fn is_unique(
        &self,
        company_id: i32,
        period_end: NaiveDate,
        period_type: &str,
        exclude_id: Option<i32>,
    ) -> RepositoryResult<bool> {
        Ok(!self
            .tables
            .read()
            .period_taken(company_id, period_end, period_type, exclude_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::error::{
        DUPLICATE_COMPANY_NAME, DUPLICATE_COMPANY_TICKER, DUPLICATE_METRICS_PERIOD,
    };
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn companies(store: &InMemoryStore) -> &dyn CompanyRepository {
        store
    }

    fn metrics(store: &InMemoryStore) -> &dyn FinancialMetricsRepository {
        store
    }

    #[test]
    fn test_create_company_assigns_increasing_ids() {
        let store = InMemoryStore::new();

        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        let globex = companies(&store).create(NewCompany::new("Globex", "GBX")).unwrap();

        assert_eq!(acme.id, 1);
        assert_eq!(globex.id, 2);
        assert_eq!(acme.created_at, acme.updated_at);
        assert_eq!(acme.currency, "USD");
        assert!(acme.is_active);
        assert_eq!(acme.last_data_update, None);
    }

    #[test]
    fn test_duplicate_name_or_ticker_ignores_case() {
        let store = InMemoryStore::new();
        companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();

        let err = companies(&store)
            .create(NewCompany::new("acme", "OTHER"))
            .unwrap_err();
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_COMPANY_NAME));

        let err = companies(&store)
            .create(NewCompany::new("Acme Two", "acme"))
            .unwrap_err();
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_COMPANY_TICKER));

        assert_eq!(companies(&store).list(Page::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let first = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        companies(&store).delete(first.id).unwrap();

        let second = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_find_by_ticker() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();

        let found = companies(&store).find_by_ticker("acme").unwrap();
        assert_eq!(found.map(|c| c.id), Some(acme.id));
        assert!(companies(&store).find_by_ticker("NONE").unwrap().is_none());
    }

    #[test]
    fn test_find_missing_company_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            companies(&store).find_by_id(99),
            Err(RepositoryError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn test_list_companies_pages_in_id_order() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            companies(&store)
                .create(NewCompany::new(format!("Company {}", i), format!("C{}", i)))
                .unwrap();
        }

        let page = companies(&store).list(Page::new(Some(1), Some(2))).unwrap();
        let ids: Vec<i32> = page.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_update_to_own_name_succeeds_but_other_name_fails() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        companies(&store).create(NewCompany::new("Globex", "GBX")).unwrap();

        let same = CompanyChanges {
            name: Some("ACME".to_string()),
            ..Default::default()
        };
        let updated = companies(&store).update(acme.id, same).unwrap();
        assert_eq!(updated.name, "ACME");
        assert!(updated.updated_at >= updated.created_at);

        let taken = CompanyChanges {
            name: Some("globex".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            companies(&store).update(acme.id, taken),
            Err(RepositoryError::Duplicate(_))
        ));
        assert_eq!(companies(&store).find_by_id(acme.id).unwrap().name, "ACME");
    }

    #[test]
    fn test_update_missing_company_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            companies(&store).update(7, CompanyChanges::default()),
            Err(RepositoryError::NotFound { id: 7, .. })
        ));
    }

    #[test]
    fn test_update_merges_only_provided_fields() {
        let store = InMemoryStore::new();
        let acme = companies(&store)
            .create(NewCompany::new("Acme", "ACME").with_sector("Industrials"))
            .unwrap();

        let changes = CompanyChanges {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = companies(&store).update(acme.id, changes).unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.sector.as_deref(), Some("Industrials"));
        assert_eq!(updated.ticker, "ACME");
    }

    #[test]
    fn test_delete_company_cascades_to_metrics() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        let globex = companies(&store).create(NewCompany::new("Globex", "GBX")).unwrap();

        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2023, 12, 31), "annual"))
            .unwrap();
        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2022, 12, 31), "annual"))
            .unwrap();
        let kept = metrics(&store)
            .create(NewFinancialMetrics::new(globex.id, date(2023, 12, 31), "annual"))
            .unwrap();

        companies(&store).delete(acme.id).unwrap();

        assert!(metrics(&store)
            .list_by_company(acme.id, Page::default())
            .unwrap()
            .is_empty());
        let remaining = metrics(&store).list(Page::default()).unwrap();
        assert_eq!(remaining, vec![kept]);

        assert!(matches!(
            companies(&store).delete(acme.id),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_values_wider_than_their_column_are_rejected() {
        let store = InMemoryStore::new();

        let err = companies(&store)
            .create(NewCompany::new("Acme", "T".repeat(40)).with_currency("EURO"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
        assert!(companies(&store).list(Page::default()).unwrap().is_empty());

        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        let changes = CompanyChanges {
            currency: Some("EURO".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            companies(&store).update(acme.id, changes),
            Err(RepositoryError::ConstraintViolation(_))
        ));
        assert_eq!(companies(&store).find_by_id(acme.id).unwrap().currency, "USD");

        let err = metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2023, 12, 31), "p".repeat(21)))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
    }

    #[test]
    fn test_malformed_website_is_rejected() {
        let store = InMemoryStore::new();

        let err = companies(&store)
            .create(NewCompany::new("Acme", "ACME").with_website("not a url"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));

        let acme = companies(&store)
            .create(NewCompany::new("Acme", "ACME").with_website("https://acme.example.com"))
            .unwrap();
        let changes = CompanyChanges {
            website: Some(Some("acme.example.com".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            companies(&store).update(acme.id, changes),
            Err(RepositoryError::ConstraintViolation(_))
        ));
        assert_eq!(
            companies(&store).find_by_id(acme.id).unwrap().website.as_deref(),
            Some("https://acme.example.com")
        );
    }

    #[test]
    fn test_only_ascii_letters_fold_in_identity() {
        let store = InMemoryStore::new();
        companies(&store).create(NewCompany::new("Émile SA", "EMIL")).unwrap();

        assert!(companies(&store).create(NewCompany::new("ÉMILE SA", "EMI2")).is_err());
        assert!(companies(&store).create(NewCompany::new("émile sa", "EMI3")).is_ok());
    }

    #[test]
    fn test_metrics_require_existing_company() {
        let store = InMemoryStore::new();
        let err = metrics(&store)
            .create(NewFinancialMetrics::new(42, date(2023, 12, 31), "annual"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
    }

    #[test]
    fn test_metrics_period_key_is_unique() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        let globex = companies(&store).create(NewCompany::new("Globex", "GBX")).unwrap();
        let end = date(2023, 12, 31);

        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, end, "annual").with_revenue(dec!(100)))
            .unwrap();

        let err = metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, end, "annual"))
            .unwrap_err();
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_METRICS_PERIOD));

        // differing in any one component is fine
        metrics(&store)
            .create(NewFinancialMetrics::new(globex.id, end, "annual"))
            .unwrap();
        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2023, 9, 30), "annual"))
            .unwrap();
        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, end, "quarterly"))
            .unwrap();

        assert!(!metrics(&store).is_unique(acme.id, end, "annual", None).unwrap());
    }

    #[test]
    fn test_list_by_company_orders_most_recent_first() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();

        for end in [date(2021, 12, 31), date(2023, 12, 31), date(2022, 12, 31)] {
            metrics(&store)
                .create(NewFinancialMetrics::new(acme.id, end, "annual"))
                .unwrap();
        }

        let rows = metrics(&store)
            .list_by_company(acme.id, Page::default())
            .unwrap();
        let ends: Vec<NaiveDate> = rows.iter().map(|m| m.period_end).collect();
        assert_eq!(
            ends,
            vec![date(2023, 12, 31), date(2022, 12, 31), date(2021, 12, 31)]
        );

        let second_page = metrics(&store)
            .list_by_company(acme.id, Page::new(Some(1), Some(1)))
            .unwrap();
        assert_eq!(second_page[0].period_end, date(2022, 12, 31));
    }

    #[test]
    fn test_update_metrics_rechecks_period_key() {
        let store = InMemoryStore::new();
        let acme = companies(&store).create(NewCompany::new("Acme", "ACME")).unwrap();
        metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2023, 12, 31), "annual"))
            .unwrap();
        let q4 = metrics(&store)
            .create(NewFinancialMetrics::new(acme.id, date(2023, 12, 31), "quarterly"))
            .unwrap();

        let clash = FinancialMetricsChanges {
            period_type: Some("annual".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            metrics(&store).update(q4.id, clash),
            Err(RepositoryError::Duplicate(_))
        ));

        let figures = FinancialMetricsChanges {
            period_type: Some("quarterly".to_string()),
            revenue: Some(Some(dec!(25))),
            ..Default::default()
        };
        let updated = metrics(&store).update(q4.id, figures).unwrap();
        assert_eq!(updated.revenue, Some(dec!(25)));
        assert_eq!(updated.period_type, "quarterly");
    }

    #[test]
    fn test_delete_missing_metrics_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            metrics(&store).delete(1),
            Err(RepositoryError::NotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_concurrent_creates_admit_one_winner() {
        let store = InMemoryStore::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    CompanyRepository::create(
                        &store,
                        NewCompany::new("Acme", format!("ACM{}", i)),
                    )
                    .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
    }
}
