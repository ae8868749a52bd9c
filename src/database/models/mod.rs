pub mod company;
pub mod financial_metrics;
pub mod patch;

pub use company::{Company, CompanyChanges, NewCompany, DEFAULT_CURRENCY};
pub use financial_metrics::{FinancialMetrics, FinancialMetricsChanges, NewFinancialMetrics};
