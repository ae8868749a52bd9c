use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{FinancialMetrics, FinancialMetricsChanges, NewFinancialMetrics};
use crate::database::repositories::error::{
    RepositoryError, RepositoryResult, DUPLICATE_METRICS_PERIOD,
};
use crate::database::repositories::{ensure_max_len, ensure_not_blank, Page};
use crate::database::schema::{companies, financial_metrics};
use chrono::{NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::sync::Arc;

/// Financial metrics repository trait
///
/// At most one row per (company_id, period_end, period_type). Rows belong to
/// an existing company; deleting the company removes them.
pub trait FinancialMetricsRepository: Send + Sync {
    /// Insert metrics; `ConstraintViolation` for an unknown company, `Duplicate` for a taken period
    fn create(&self, new_metrics: NewFinancialMetrics) -> RepositoryResult<FinancialMetrics>;

    /// Find metrics by ID; `NotFound` if absent
    fn find_by_id(&self, metrics_id: i32) -> RepositoryResult<FinancialMetrics>;

    /// Page through all metrics in primary-key order
    fn list(&self, page: Page) -> RepositoryResult<Vec<FinancialMetrics>>;

    /// Metrics of one company, most recent `period_end` first
    fn list_by_company(&self, company_id: i32, page: Page)
        -> RepositoryResult<Vec<FinancialMetrics>>;

    /// Merge a partial update; re-checks uniqueness when the period key changes
    fn update(
        &self,
        metrics_id: i32,
        changes: FinancialMetricsChanges,
    ) -> RepositoryResult<FinancialMetrics>;

    /// Delete metrics by ID
    fn delete(&self, metrics_id: i32) -> RepositoryResult<()>;

    /// Check that no other row uses this (company, period end, period type)
    fn is_unique(
        &self,
        company_id: i32,
        period_end: NaiveDate,
        period_type: &str,
        exclude_id: Option<i32>,
    ) -> RepositoryResult<bool>;
}

/// Does `existing` occupy the given period key?
pub fn occupies_period(
    existing: &FinancialMetrics,
    company_id: i32,
    period_end: NaiveDate,
    period_type: &str,
) -> bool {
    existing.company_id == company_id
        && existing.period_end == period_end
        && existing.period_type == period_type
}

pub fn duplicate_metrics_error() -> RepositoryError {
    RepositoryError::Duplicate(DUPLICATE_METRICS_PERIOD.to_string())
}

const PERIOD_TYPE_MAX_LEN: usize = 20;

pub(crate) fn validate_period_type(period_type: &str) -> RepositoryResult<()> {
    ensure_not_blank("period_type", period_type)?;
    ensure_max_len("period_type", period_type, PERIOD_TYPE_MAX_LEN)
}

/// Concrete implementation of FinancialMetricsRepository
///
/// Uses PostgreSQL connection pool from DatabasePool
pub struct FinancialMetricsRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl FinancialMetricsRepositoryImpl {
    /// Create new financial metrics repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }

    fn period_taken(
        conn: &mut PgConnection,
        company_id: i32,
        period_end: NaiveDate,
        period_type: &str,
        exclude_id: Option<i32>,
    ) -> QueryResult<bool> {
        let mut query = financial_metrics::table
            .filter(financial_metrics::company_id.eq(company_id))
            .filter(financial_metrics::period_end.eq(period_end))
            .filter(financial_metrics::period_type.eq(period_type))
            .select(financial_metrics::id)
            .into_boxed();

        if let Some(id) = exclude_id {
            query = query.filter(financial_metrics::id.ne(id));
        }

        Ok(query.first::<i32>(conn).optional()?.is_some())
    }
}

impl FinancialMetricsRepository for FinancialMetricsRepositoryImpl {
    fn create(&self, new_metrics: NewFinancialMetrics) -> RepositoryResult<FinancialMetrics> {
        validate_period_type(&new_metrics.period_type)?;
        let mut conn = (self.get_conn)()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let company_exists = diesel::select(diesel::dsl::exists(
                companies::table.filter(companies::id.eq(new_metrics.company_id)),
            ))
            .get_result::<bool>(conn)?;

            if !company_exists {
                return Err(RepositoryError::unknown_company(new_metrics.company_id));
            }

            if Self::period_taken(
                conn,
                new_metrics.company_id,
                new_metrics.period_end,
                &new_metrics.period_type,
                None,
            )? {
                tracing::warn!(
                    "Rejected metrics for company {} ({} {}): period already recorded",
                    new_metrics.company_id,
                    new_metrics.period_type,
                    new_metrics.period_end
                );
                return Err(duplicate_metrics_error());
            }

            // FK and unique constraint still guard the race window after the checks
            let now = Utc::now();
            let metrics = diesel::insert_into(financial_metrics::table)
                .values((
                    &new_metrics,
                    financial_metrics::created_at.eq(now),
                    financial_metrics::updated_at.eq(now),
                ))
                .returning(FinancialMetrics::as_returning())
                .get_result(conn)?;

            tracing::info!(
                "Created financial metrics {} for company {}",
                metrics.id,
                metrics.company_id
            );
            Ok(metrics)
        })
    }

    fn find_by_id(&self, metrics_id: i32) -> RepositoryResult<FinancialMetrics> {
        let mut conn = (self.get_conn)()?;

        financial_metrics::table
            .find(metrics_id)
            .select(FinancialMetrics::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| RepositoryError::metrics_not_found(metrics_id))
    }

    fn list(&self, page: Page) -> RepositoryResult<Vec<FinancialMetrics>> {
        let mut conn = (self.get_conn)()?;

        financial_metrics::table
            .order(financial_metrics::id.asc())
            .offset(page.skip)
            .limit(page.limit)
            .select(FinancialMetrics::as_select())
            .load(&mut conn)
            .map_err(RepositoryError::from)
    }

    fn list_by_company(
        &self,
        company_id: i32,
        page: Page,
    ) -> RepositoryResult<Vec<FinancialMetrics>> {
        let mut conn = (self.get_conn)()?;

        financial_metrics::table
            .filter(financial_metrics::company_id.eq(company_id))
            .order((
                financial_metrics::period_end.desc(),
                financial_metrics::id.asc(),
            ))
            .offset(page.skip)
            .limit(page.limit)
            .select(FinancialMetrics::as_select())
            .load(&mut conn)
            .map_err(RepositoryError::from)
    }

    fn update(
        &self,
        metrics_id: i32,
        changes: FinancialMetricsChanges,
    ) -> RepositoryResult<FinancialMetrics> {
        if let Some(period_type) = &changes.period_type {
            validate_period_type(period_type)?;
        }
        let mut conn = (self.get_conn)()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let current = financial_metrics::table
                .find(metrics_id)
                .select(FinancialMetrics::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::metrics_not_found(metrics_id))?;

            if changes.touches_period_key() {
                let period_end = changes.period_end.unwrap_or(current.period_end);
                let period_type = changes
                    .period_type
                    .as_deref()
                    .unwrap_or(&current.period_type);

                if Self::period_taken(
                    conn,
                    current.company_id,
                    period_end,
                    period_type,
                    Some(metrics_id),
                )? {
                    return Err(duplicate_metrics_error());
                }
            }

            let metrics = diesel::update(financial_metrics::table.find(metrics_id))
                .set((&changes, financial_metrics::updated_at.eq(Utc::now())))
                .returning(FinancialMetrics::as_returning())
                .get_result(conn)?;

            tracing::debug!("Updated financial metrics {}", metrics_id);
            Ok(metrics)
        })
    }

    fn delete(&self, metrics_id: i32) -> RepositoryResult<()> {
        let mut conn = (self.get_conn)()?;

        let deleted =
            diesel::delete(financial_metrics::table.find(metrics_id)).execute(&mut conn)?;

        if deleted == 0 {
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
        let mut conn = (self.get_conn)()?;

        Ok(!Self::period_taken(
            &mut conn,
            company_id,
            period_end,
            period_type,
            exclude_id,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_period_key_requires_all_three_fields() {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let row = NewFinancialMetrics::new(1, end, "annual")
            .with_revenue(dec!(100))
            .into_record(1, Utc::now());

        assert!(occupies_period(&row, 1, end, "annual"));
        assert!(!occupies_period(&row, 2, end, "annual"));
        assert!(!occupies_period(&row, 1, end.pred_opt().unwrap(), "annual"));
        assert!(!occupies_period(&row, 1, end, "quarterly"));
    }

    #[test]
    fn test_blank_period_type_is_rejected() {
        assert!(matches!(
            validate_period_type(" "),
            Err(RepositoryError::ConstraintViolation(_))
        ));
        assert!(validate_period_type("annual").is_ok());
    }

    #[test]
    fn test_overlong_period_type_is_rejected() {
        assert!(validate_period_type("trailing-twelve-mnth").is_ok());
        assert!(matches!(
            validate_period_type("trailing-twelve-months"),
            Err(RepositoryError::ConstraintViolation(_))
        ));
    }
}
