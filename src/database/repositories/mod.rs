/// Repository layer for companies and their financial metrics
///
/// Each entity has a trait describing its operations and two stores:
/// - PostgreSQL (`*RepositoryImpl`), where unique indexes are the final authority
/// - `InMemoryStore`, where one lock makes every check-and-write atomic
///
/// Handlers depend on the traits only.

pub mod company_repository;
pub mod error;
pub mod financial_metrics_repository;
pub mod memory;

pub use company_repository::{CompanyRepository, CompanyRepositoryImpl};
pub use error::{RepositoryError, RepositoryResult};
pub use financial_metrics_repository::{
    FinancialMetricsRepository, FinancialMetricsRepositoryImpl,
};
pub use memory::InMemoryStore;

use url::Url;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Offset/limit window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    /// Build a page from optional query values, applying defaults and the cap
    pub fn new(skip: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            skip: skip.map(i64::from).unwrap_or(0),
            limit: limit
                .map(i64::from)
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        }
    }

    /// Apply the window to an already ordered iterator
    pub fn slice<T, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Reject empty or whitespace-only values for required text columns
pub(crate) fn ensure_not_blank(field: &str, value: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::ConstraintViolation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

/// Reject values longer than the column's `VARCHAR(max)` (counted in characters)
pub(crate) fn ensure_max_len(field: &str, value: &str, max: usize) -> RepositoryResult<()> {
    if value.chars().count() > max {
        return Err(RepositoryError::ConstraintViolation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Require an absolute http(s) URL
pub(crate) fn ensure_http_url(field: &str, value: &str) -> RepositoryResult<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        Ok(_) => Err(RepositoryError::ConstraintViolation(format!(
            "{} must be an http or https URL",
            field
        ))),
        Err(e) => Err(RepositoryError::ConstraintViolation(format!(
            "{} is not a valid URL: {}",
            field, e
        ))),
    }
}
