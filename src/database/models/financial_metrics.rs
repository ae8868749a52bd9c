use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::patch::double_option;

/// Financial metrics for one company over one reporting period
///
/// At most one row exists per (company_id, period_end, period_type).
/// Rows are owned by their company and deleted with it.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema,
)]
#[diesel(table_name = crate::database::schema::financial_metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FinancialMetrics {
    pub id: i32,

    /// Owning company (foreign key to companies table)
    pub company_id: i32,

    /// Last day of the reporting period
    pub period_end: NaiveDate,

    /// Reporting period category (e.g., "annual", "quarterly")
    pub period_type: String,

    // Statement figures
    pub revenue: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub total_assets: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub total_equity: Option<Decimal>,

    // Profitability
    pub roe: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub net_margin: Option<Decimal>,

    // Liquidity
    pub current_ratio: Option<Decimal>,
    pub quick_ratio: Option<Decimal>,

    // Debt
    pub debt_to_equity: Option<Decimal>,
    pub debt_to_assets: Option<Decimal>,

    // Efficiency
    pub asset_turnover: Option<Decimal>,
    pub inventory_turnover: Option<Decimal>,

    // Growth
    pub revenue_growth: Option<Decimal>,
    pub net_income_growth: Option<Decimal>,

    // Valuation
    pub pe_ratio: Option<Decimal>,
    pub pb_ratio: Option<Decimal>,
    pub ev_ebitda: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New financial metrics for insertion (also the `POST /financial-metrics` body)
#[derive(Debug, Clone, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::financial_metrics)]
pub struct NewFinancialMetrics {
    pub company_id: i32,
    #[schema(example = "2023-12-31")]
    pub period_end: NaiveDate,
    #[schema(example = "annual")]
    pub period_type: String,
    pub revenue: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub total_assets: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub total_equity: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub net_margin: Option<Decimal>,
    pub current_ratio: Option<Decimal>,
    pub quick_ratio: Option<Decimal>,
    pub debt_to_equity: Option<Decimal>,
    pub debt_to_assets: Option<Decimal>,
    pub asset_turnover: Option<Decimal>,
    pub inventory_turnover: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub net_income_growth: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub pb_ratio: Option<Decimal>,
    pub ev_ebitda: Option<Decimal>,
}

impl NewFinancialMetrics {
    /// Create metrics for a period with every figure unset
    pub fn new(company_id: i32, period_end: NaiveDate, period_type: impl Into<String>) -> Self {
        Self {
            company_id,
            period_end,
            period_type: period_type.into(),
            revenue: None,
            net_income: None,
            total_assets: None,
            total_liabilities: None,
            total_equity: None,
            roe: None,
            roa: None,
            gross_margin: None,
            net_margin: None,
            current_ratio: None,
            quick_ratio: None,
            debt_to_equity: None,
            debt_to_assets: None,
            asset_turnover: None,
            inventory_turnover: None,
            revenue_growth: None,
            net_income_growth: None,
            pe_ratio: None,
            pb_ratio: None,
            ev_ebitda: None,
        }
    }

    pub fn with_revenue(mut self, revenue: Decimal) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_net_income(mut self, net_income: Decimal) -> Self {
        self.net_income = Some(net_income);
        self
    }

    /// Materialize a stored row (used by stores that assign ids themselves)
    pub fn into_record(self, id: i32, now: DateTime<Utc>) -> FinancialMetrics {
        FinancialMetrics {
            id,
            company_id: self.company_id,
            period_end: self.period_end,
            period_type: self.period_type,
            revenue: self.revenue,
            net_income: self.net_income,
            total_assets: self.total_assets,
            total_liabilities: self.total_liabilities,
            total_equity: self.total_equity,
            roe: self.roe,
            roa: self.roa,
            gross_margin: self.gross_margin,
            net_margin: self.net_margin,
            current_ratio: self.current_ratio,
            quick_ratio: self.quick_ratio,
            debt_to_equity: self.debt_to_equity,
            debt_to_assets: self.debt_to_assets,
            asset_turnover: self.asset_turnover,
            inventory_turnover: self.inventory_turnover,
            revenue_growth: self.revenue_growth,
            net_income_growth: self.net_income_growth,
            pe_ratio: self.pe_ratio,
            pb_ratio: self.pb_ratio,
            ev_ebitda: self.ev_ebitda,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for financial metrics (the `PUT /financial-metrics/{id}` body)
///
/// The owning company cannot be changed. Changing `period_end` or
/// `period_type` re-checks the period uniqueness key.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::financial_metrics)]
pub struct FinancialMetricsChanges {
    pub period_end: Option<NaiveDate>,
    pub period_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub revenue: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub net_income: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub total_assets: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub total_liabilities: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub total_equity: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub roe: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub roa: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub gross_margin: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub net_margin: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub current_ratio: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub quick_ratio: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub debt_to_equity: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub debt_to_assets: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub asset_turnover: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub inventory_turnover: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub revenue_growth: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub net_income_growth: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub pe_ratio: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub pb_ratio: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub ev_ebitda: Option<Option<Decimal>>,
}

impl FinancialMetricsChanges {
    /// True when the patch changes part of the (company, period end, period type) key
    pub fn touches_period_key(&self) -> bool {
        self.period_end.is_some() || self.period_type.is_some()
    }

    /// Merge the provided fields into an existing record (timestamps excluded)
    pub fn apply_to(self, metrics: &mut FinancialMetrics) {
        fn merge(target: &mut Option<Decimal>, patch: Option<Option<Decimal>>) {
            if let Some(value) = patch {
                *target = value;
            }
        }

        if let Some(period_end) = self.period_end {
            metrics.period_end = period_end;
        }
        if let Some(period_type) = self.period_type {
            metrics.period_type = period_type;
        }
        merge(&mut metrics.revenue, self.revenue);
        merge(&mut metrics.net_income, self.net_income);
        merge(&mut metrics.total_assets, self.total_assets);
        merge(&mut metrics.total_liabilities, self.total_liabilities);
        merge(&mut metrics.total_equity, self.total_equity);
        merge(&mut metrics.roe, self.roe);
        merge(&mut metrics.roa, self.roa);
        merge(&mut metrics.gross_margin, self.gross_margin);
        merge(&mut metrics.net_margin, self.net_margin);
        merge(&mut metrics.current_ratio, self.current_ratio);
        merge(&mut metrics.quick_ratio, self.quick_ratio);
        merge(&mut metrics.debt_to_equity, self.debt_to_equity);
        merge(&mut metrics.debt_to_assets, self.debt_to_assets);
        merge(&mut metrics.asset_turnover, self.asset_turnover);
        merge(&mut metrics.inventory_turnover, self.inventory_turnover);
        merge(&mut metrics.revenue_growth, self.revenue_growth);
        merge(&mut metrics.net_income_growth, self.net_income_growth);
        merge(&mut metrics.pe_ratio, self.pe_ratio);
        merge(&mut metrics.pb_ratio, self.pb_ratio);
        merge(&mut metrics.ev_ebitda, self.ev_ebitda);
    }
}
