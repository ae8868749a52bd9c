use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::patch::double_option;

/// Currency assumed when a company is created without one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Company entity - a listed issuer whose financial metrics are tracked
///
/// Name and ticker are each unique across all companies, compared case-insensitively.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema,
)]
#[diesel(table_name = crate::database::schema::companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Company {
    /// Generated identifier
    pub id: i32,

    /// Legal name (e.g., "Apple Inc.")
    pub name: String,

    /// Exchange ticker (e.g., "AAPL")
    pub ticker: String,

    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub country: Option<String>,
    pub exchange: Option<String>,

    /// ISO currency code the financials are reported in
    pub currency: String,

    /// Timestamp when record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when record was last updated
    pub updated_at: DateTime<Utc>,

    pub is_active: bool,

    /// Timestamp of the last financial data refresh, if any
    pub last_data_update: Option<DateTime<Utc>>,
}

/// New company for insertion (also the `POST /companies` body)
#[derive(Debug, Clone, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::companies)]
pub struct NewCompany {
    #[schema(example = "Apple Inc.")]
    pub name: String,
    #[schema(example = "AAPL")]
    pub ticker: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    /// Defaults to USD when absent or null
    #[serde(default)]
    #[schema(example = "USD")]
    pub currency: Option<String>,
}

impl NewCompany {
    /// Create a new company builder
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            sector: None,
            industry: None,
            description: None,
            website: None,
            country: None,
            exchange: None,
            currency: None,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Currency that will be stored for this company
    pub fn effective_currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Partial update for a company (the `PUT /companies/{id}` body)
///
/// Absent fields are left untouched. For nullable columns an explicit `null`
/// clears the stored value.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::companies)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub sector: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub exchange: Option<Option<String>>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_data_update: Option<Option<DateTime<Utc>>>,
}

impl CompanyChanges {
    /// True when the patch changes a uniquely-constrained field
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.ticker.is_some()
    }

    /// Merge the provided fields into an existing record (timestamps excluded)
    pub fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(ticker) = self.ticker {
            company.ticker = ticker;
        }
        if let Some(sector) = self.sector {
            company.sector = sector;
        }
        if let Some(industry) = self.industry {
            company.industry = industry;
        }
        if let Some(description) = self.description {
            company.description = description;
        }
        if let Some(website) = self.website {
            company.website = website;
        }
        if let Some(country) = self.country {
            company.country = country;
        }
        if let Some(exchange) = self.exchange {
            company.exchange = exchange;
        }
        if let Some(currency) = self.currency {
            company.currency = currency;
        }
        if let Some(is_active) = self.is_active {
            company.is_active = is_active;
        }
        if let Some(last_data_update) = self.last_data_update {
            company.last_data_update = last_data_update;
        }
    }
}
