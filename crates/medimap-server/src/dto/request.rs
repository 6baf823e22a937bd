//! Request DTOs for API endpoints.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Query parameters selecting a statistics year.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct YearQuery {
    /// Year of the statistics (default: 2023, range 1900..=2100)
    #[param(example = 2023)]
    pub year: Option<i32>,
}

/// Default number of drugs returned by `/stats/drugs`.
pub const DEFAULT_TOP_DRUGS: usize = 10;

/// Upper bound for `/stats/drugs`.
pub const MAX_TOP_DRUGS: usize = 100;

/// Query parameters for per-drug totals.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DrugTotalsQuery {
    /// Year of the statistics (default: 2023)
    #[param(example = 2023)]
    pub year: Option<i32>,

    /// Maximum number of drugs (default: 10, max: 100)
    #[param(example = 10)]
    pub limit: Option<usize>,
}

/// Query parameters for drug search.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DrugSearchQuery {
    /// Case-insensitive substring of the drug name (min: 3 characters)
    #[serde(default)]
    #[param(example = "doliprane")]
    pub q: String,

    /// Maximum number of results (default: 20, max: 100)
    #[param(example = 20)]
    pub limit: Option<usize>,
}

/// Query parameters for paging through the drug catalog.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Number of drugs to skip (default: 0)
    #[param(example = 0)]
    pub skip: Option<usize>,

    /// Page size (default: 100, max: 1000)
    #[param(example = 100)]
    pub limit: Option<usize>,
}
