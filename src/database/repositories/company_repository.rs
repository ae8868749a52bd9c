use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{Company, CompanyChanges, NewCompany};
use crate::database::repositories::error::{
    RepositoryError, RepositoryResult, DUPLICATE_COMPANY_NAME, DUPLICATE_COMPANY_TICKER,
};
use crate::database::repositories::{
    ensure_http_url, ensure_max_len, ensure_not_blank, Page,
};
use crate::database::schema::companies;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::sync::Arc;

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// Company repository trait - defines interface for company operations
///
/// Name and ticker are unique across companies, compared case-insensitively.
/// Implementations must make the uniqueness check and the write atomic, or
/// translate the store's own constraint violation into `Duplicate`.
pub trait CompanyRepository: Send + Sync {
    /// Insert a new company; `Duplicate` if name or ticker is taken
    fn create(&self, new_company: NewCompany) -> RepositoryResult<Company>;

    /// Find company by ID; `NotFound` if absent
    fn find_by_id(&self, company_id: i32) -> RepositoryResult<Company>;

    /// Find company by ticker (case-insensitive)
    fn find_by_ticker(&self, ticker: &str) -> RepositoryResult<Option<Company>>;

    /// Page through companies in primary-key order
    fn list(&self, page: Page) -> RepositoryResult<Vec<Company>>;

    /// Merge a partial update; re-checks uniqueness when name or ticker is supplied
    fn update(&self, company_id: i32, changes: CompanyChanges) -> RepositoryResult<Company>;

    /// Delete company by ID together with all of its financial metrics
    fn delete(&self, company_id: i32) -> RepositoryResult<()>;

    /// Check that no other company uses `name` or `ticker`
    fn is_unique(&self, name: &str, ticker: &str, exclude_id: Option<i32>)
        -> RepositoryResult<bool>;
}

/// Case-insensitive comparison used for company names and tickers
///
/// Only ASCII letters fold. The columns use the "C" collation, so
/// PostgreSQL's `lower()` folds the same way and both stores agree on
/// non-ASCII names.
pub fn same_identity(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Does `existing` collide with the candidate name or ticker?
pub fn conflicts_with(existing: &Company, name: &str, ticker: &str) -> bool {
    same_identity(&existing.name, name) || same_identity(&existing.ticker, ticker)
}

/// Build the `Duplicate` error for a collision, naming the clashing field
pub fn duplicate_company_error(existing: &Company, name: &str) -> RepositoryError {
    if same_identity(&existing.name, name) {
        RepositoryError::Duplicate(DUPLICATE_COMPANY_NAME.to_string())
    } else {
        RepositoryError::Duplicate(DUPLICATE_COMPANY_TICKER.to_string())
    }
}

// Column widths from the companies migration
const NAME_MAX_LEN: usize = 255;
const TICKER_MAX_LEN: usize = 20;
const SECTOR_MAX_LEN: usize = 100;
const INDUSTRY_MAX_LEN: usize = 100;
const WEBSITE_MAX_LEN: usize = 500;
const COUNTRY_MAX_LEN: usize = 100;
const EXCHANGE_MAX_LEN: usize = 50;
const CURRENCY_MAX_LEN: usize = 3;

fn validate_name(name: &str) -> RepositoryResult<()> {
    ensure_not_blank("name", name)?;
    ensure_max_len("name", name, NAME_MAX_LEN)
}

fn validate_ticker(ticker: &str) -> RepositoryResult<()> {
    ensure_not_blank("ticker", ticker)?;
    ensure_max_len("ticker", ticker, TICKER_MAX_LEN)
}

fn validate_website(website: &str) -> RepositoryResult<()> {
    ensure_max_len("website", website, WEBSITE_MAX_LEN)?;
    ensure_http_url("website", website)
}

fn validate_optional(field: &str, value: Option<&str>, max: usize) -> RepositoryResult<()> {
    match value {
        Some(value) => ensure_max_len(field, value, max),
        None => Ok(()),
    }
}

pub(crate) fn validate_new_company(new_company: &NewCompany) -> RepositoryResult<()> {
    validate_name(&new_company.name)?;
    validate_ticker(&new_company.ticker)?;
    validate_optional("sector", new_company.sector.as_deref(), SECTOR_MAX_LEN)?;
    validate_optional("industry", new_company.industry.as_deref(), INDUSTRY_MAX_LEN)?;
    validate_optional("country", new_company.country.as_deref(), COUNTRY_MAX_LEN)?;
    validate_optional("exchange", new_company.exchange.as_deref(), EXCHANGE_MAX_LEN)?;
    validate_optional("currency", new_company.currency.as_deref(), CURRENCY_MAX_LEN)?;
    if let Some(website) = &new_company.website {
        validate_website(website)?;
    }
    Ok(())
}

pub(crate) fn validate_company_changes(changes: &CompanyChanges) -> RepositoryResult<()> {
    if let Some(name) = &changes.name {
        validate_name(name)?;
    }
    if let Some(ticker) = &changes.ticker {
        validate_ticker(ticker)?;
    }
    // `Some(None)` clears the column and needs no check
    validate_optional(
        "sector",
        changes.sector.as_ref().and_then(Option::as_deref),
        SECTOR_MAX_LEN,
    )?;
    validate_optional(
        "industry",
        changes.industry.as_ref().and_then(Option::as_deref),
        INDUSTRY_MAX_LEN,
    )?;
    validate_optional(
        "country",
        changes.country.as_ref().and_then(Option::as_deref),
        COUNTRY_MAX_LEN,
    )?;
    validate_optional(
        "exchange",
        changes.exchange.as_ref().and_then(Option::as_deref),
        EXCHANGE_MAX_LEN,
    )?;
    validate_optional("currency", changes.currency.as_deref(), CURRENCY_MAX_LEN)?;
    if let Some(Some(website)) = &changes.website {
        validate_website(website)?;
    }
    Ok(())
}

/// Concrete implementation of CompanyRepository
///
/// Uses PostgreSQL connection pool from DatabasePool. Each operation runs in
/// its own transaction.
pub struct CompanyRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl CompanyRepositoryImpl {
    /// Create new company repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }

    /// First company (other than `exclude_id`) whose name or ticker matches
    fn find_conflict(
        conn: &mut PgConnection,
        name: &str,
        ticker: &str,
        exclude_id: Option<i32>,
    ) -> QueryResult<Option<Company>> {
        let mut query = companies::table
            .filter(
                lower(companies::name)
                    .eq(name.to_ascii_lowercase())
                    .or(lower(companies::ticker).eq(ticker.to_ascii_lowercase())),
            )
            .select(Company::as_select())
            .into_boxed();

        if let Some(id) = exclude_id {
            query = query.filter(companies::id.ne(id));
        }

        query.first(conn).optional()
    }
}

impl CompanyRepository for CompanyRepositoryImpl {
    fn create(&self, new_company: NewCompany) -> RepositoryResult<Company> {
        validate_new_company(&new_company)?;
        let mut conn = (self.get_conn)()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            if let Some(existing) =
                Self::find_conflict(conn, &new_company.name, &new_company.ticker, None)?
            {
                tracing::warn!(
                    "Rejected company {} ({}): conflicts with company {}",
                    new_company.name,
                    new_company.ticker,
                    existing.id
                );
                return Err(duplicate_company_error(&existing, &new_company.name));
            }

            let now = Utc::now();
            let company = diesel::insert_into(companies::table)
                .values((
                    &new_company,
                    companies::created_at.eq(now),
                    companies::updated_at.eq(now),
                ))
                .returning(Company::as_returning())
                .get_result(conn)?;

            tracing::info!("Created company {} ({})", company.id, company.ticker);
            Ok(company)
        })
    }

    fn find_by_id(&self, company_id: i32) -> RepositoryResult<Company> {
        let mut conn = (self.get_conn)()?;

        companies::table
            .find(company_id)
            .select(Company::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| RepositoryError::company_not_found(company_id))
    }

    fn find_by_ticker(&self, ticker: &str) -> RepositoryResult<Option<Company>> {
        let mut conn = (self.get_conn)()?;

        companies::table
            .filter(lower(companies::ticker).eq(ticker.to_ascii_lowercase()))
            .select(Company::as_select())
            .first(&mut conn)
            .optional()
            .map_err(RepositoryError::from)
    }

    fn list(&self, page: Page) -> RepositoryResult<Vec<Company>> {
        let mut conn = (self.get_conn)()?;

        companies::table
            .order(companies::id.asc())
            .offset(page.skip)
            .limit(page.limit)
            .select(Company::as_select())
            .load(&mut conn)
            .map_err(RepositoryError::from)
    }

    fn update(&self, company_id: i32, changes: CompanyChanges) -> RepositoryResult<Company> {
        validate_company_changes(&changes)?;
        let mut conn = (self.get_conn)()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let current = companies::table
                .find(company_id)
                .select(Company::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::company_not_found(company_id))?;

            if changes.touches_identity() {
                let name = changes.name.as_deref().unwrap_or(&current.name);
                let ticker = changes.ticker.as_deref().unwrap_or(&current.ticker);

                if let Some(existing) = Self::find_conflict(conn, name, ticker, Some(company_id))? {
                    tracing::warn!(
                        "Rejected update of company {}: conflicts with company {}",
                        company_id,
                        existing.id
                    );
                    return Err(duplicate_company_error(&existing, name));
                }
            }

            let company = diesel::update(companies::table.find(company_id))
                .set((&changes, companies::updated_at.eq(Utc::now())))
                .returning(Company::as_returning())
                .get_result(conn)?;

            tracing::debug!("Updated company {}", company_id);
            Ok(company)
        })
    }

    fn delete(&self, company_id: i32) -> RepositoryResult<()> {
        let mut conn = (self.get_conn)()?;

        // financial_metrics rows go with it (ON DELETE CASCADE)
        let deleted = diesel::delete(companies::table.find(company_id)).execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::company_not_found(company_id));
        }

        tracing::info!("Deleted company {}", company_id);
        Ok(())
    }

    fn is_unique(
        &self,
        name: &str,
        ticker: &str,
        exclude_id: Option<i32>,
    ) -> RepositoryResult<bool> {
        let mut conn = (self.get_conn)()?;

        Ok(Self::find_conflict(&mut conn, name, ticker, exclude_id)?.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DEFAULT_CURRENCY;

    fn company(id: i32, name: &str, ticker: &str) -> Company {
        let now = Utc::now();
        Company {
            id,
            name: name.to_string(),
            ticker: ticker.to_string(),
            sector: None,
            industry: None,
            description: None,
            website: None,
            country: None,
            exchange: None,
            currency: DEFAULT_CURRENCY.to_string(),
            created_at: now,
            updated_at: now,
            is_active: true,
            last_data_update: None,
        }
    }

    #[test]
    fn test_conflicts_ignore_case() {
        let acme = company(1, "Acme", "ACME");

        assert!(conflicts_with(&acme, "acme", "OTHER"));
        assert!(conflicts_with(&acme, "Other Corp", "acme"));
        assert!(!conflicts_with(&acme, "Acme Holdings", "ACMH"));
    }

    #[test]
    fn test_duplicate_error_names_the_field() {
        let acme = company(1, "Acme", "ACME");

        let err = duplicate_company_error(&acme, "ACME");
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_COMPANY_NAME));

        let err = duplicate_company_error(&acme, "Another name");
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_COMPANY_TICKER));
    }

    #[test]
    fn test_non_ascii_letters_do_not_fold() {
        assert!(same_identity("Acme", "ACME"));
        assert!(!same_identity("Émile SA", "émile sa"));
        assert!(same_identity("Émile SA", "Émile sa"));
    }

    #[test]
    fn test_overlong_columns_are_rejected() {
        let err = validate_new_company(&NewCompany::new("Acme", "A".repeat(21))).unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));

        let err =
            validate_new_company(&NewCompany::new("Acme", "ACME").with_currency("EURO")).unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(ref m)
            if m == "currency must be at most 3 characters"));

        let changes = CompanyChanges {
            exchange: Some(Some("X".repeat(51))),
            ..Default::default()
        };
        assert!(validate_company_changes(&changes).is_err());

        assert!(validate_new_company(&NewCompany::new("N".repeat(255), "T".repeat(20))).is_ok());
    }

    #[test]
    fn test_website_must_be_a_url() {
        let err = validate_new_company(&NewCompany::new("Acme", "ACME").with_website("not a url"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
        assert!(
            validate_new_company(&NewCompany::new("Acme", "ACME").with_website("https://acme.com"))
                .is_ok()
        );

        let bad = CompanyChanges {
            website: Some(Some("acme dot com".to_string())),
            ..Default::default()
        };
        assert!(validate_company_changes(&bad).is_err());

        let cleared = CompanyChanges {
            website: Some(None),
            ..Default::default()
        };
        assert!(validate_company_changes(&cleared).is_ok());
    }

    #[test]
    fn test_blank_identity_is_rejected() {
        let err = validate_new_company(&NewCompany::new("  ", "ACME")).unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));

        let changes = CompanyChanges {
            ticker: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_company_changes(&changes).is_err());
    }
}
