//! Response DTOs for API endpoints.
//!
//! Monetary amounts are `rust_decimal::Decimal` and serialize as strings
//! (`"5000.00"`) so no precision is lost in transit.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use medimap_core::{
    Comparison, Drug, DrugStat, Overview, Region, RegionDetail, RegionShare, RegionStat,
};

// =============================================================================
// System
// =============================================================================

/// Service description returned at the API root.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfoResponse {
    pub name: String,
    pub version: String,
    /// Interactive documentation path
    pub documentation: String,
    /// Endpoint groups
    pub endpoints: Vec<String>,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("healthy" or "unhealthy")
    pub status: String,
    /// Server version
    pub version: String,
    /// Database connectivity status
    pub database: ServiceStatus,
}

/// Status of an individual service component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    /// Whether the service is reachable
    pub healthy: bool,
    /// Optional message (e.g., error details)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Statistics
// =============================================================================

/// National totals for one year.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewResponse {
    pub year: i32,
    /// Dispensed packages
    pub total_units: i64,
    /// Reimbursed amount in euros
    #[schema(value_type = String, example = "6200.00")]
    pub total_reimbursed: Decimal,
    /// Regions with data for the year
    pub region_count: i64,
    /// Drugs in the catalog
    pub drug_count: i64,
}

impl From<Overview> for OverviewResponse {
    fn from(o: Overview) -> Self {
        Self {
            year: o.year,
            total_units: o.total_units,
            total_reimbursed: o.total_reimbursed,
            region_count: o.region_count,
            drug_count: o.drug_count,
        }
    }
}

/// Totals of one region, ranked by reimbursement.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegionStatDto {
    /// Region code (e.g. 11 for Île-de-France)
    pub code: i32,
    pub name: String,
    pub total_units: i64,
    #[schema(value_type = String, example = "5000.00")]
    pub total_reimbursed: Decimal,
}

impl From<RegionStat> for RegionStatDto {
    fn from(s: RegionStat) -> Self {
        Self {
            code: s.code,
            name: s.name,
            total_units: s.total_units,
            total_reimbursed: s.total_reimbursed,
        }
    }
}

/// Totals of one requested region.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegionDetailResponse {
    pub code: i32,
    pub name: String,
    pub year: i32,
    pub total_units: i64,
    #[schema(value_type = String, example = "1200.00")]
    pub total_reimbursed: Decimal,
}

impl From<RegionDetail> for RegionDetailResponse {
    fn from(d: RegionDetail) -> Self {
        Self {
            code: d.code,
            name: d.name,
            year: d.year,
            total_units: d.total_units,
            total_reimbursed: d.total_reimbursed,
        }
    }
}

/// A region against the mean of all regions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComparisonResponse {
    pub code: i32,
    pub name: String,
    pub year: i32,
    #[schema(value_type = String, example = "1200.00")]
    pub region_value: Decimal,
    #[schema(value_type = String, example = "3100.00")]
    pub national_mean: Decimal,
    #[schema(value_type = String, example = "-1900.00")]
    pub difference: Decimal,
    /// Percentage difference to the mean; null when the mean is zero
    #[schema(value_type = Option<String>, example = "-61.29")]
    pub percent_difference: Option<Decimal>,
    /// False when the mean is zero and no percentage exists
    pub percent_difference_defined: bool,
    /// 1-based rank by reimbursement; null when the region has no data for the year
    pub rank: Option<usize>,
    /// Number of ranked regions
    pub region_count: usize,
}

impl From<Comparison> for ComparisonResponse {
    fn from(c: Comparison) -> Self {
        Self {
            code: c.code,
            name: c.name,
            year: c.year,
            region_value: c.region_value,
            national_mean: c.national_mean,
            difference: c.difference,
            percent_difference: c.percent_difference.value(),
            percent_difference_defined: c.percent_difference.is_defined(),
            rank: c.rank,
            region_count: c.region_count,
        }
    }
}

/// Region totals with the share of the national reimbursement.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegionShareDto {
    pub code: i32,
    pub name: String,
    pub total_units: i64,
    #[schema(value_type = String, example = "5000.00")]
    pub total_reimbursed: Decimal,
    /// Percentage of the national total; null when the national total is zero
    #[schema(value_type = Option<String>, example = "80.65")]
    pub share_pct: Option<Decimal>,
}

impl From<RegionShare> for RegionShareDto {
    fn from(s: RegionShare) -> Self {
        Self {
            code: s.stat.code,
            name: s.stat.name,
            total_units: s.stat.total_units,
            total_reimbursed: s.stat.total_reimbursed,
            share_pct: s.share_pct.value(),
        }
    }
}

/// Totals of one drug across regions.
#[derive(Debug, Serialize, ToSchema)]
pub struct DrugStatDto {
    pub cip_code: String,
    pub name: String,
    pub total_units: i64,
    #[schema(value_type = String, example = "120.50")]
    pub total_reimbursed: Decimal,
}

impl From<DrugStat> for DrugStatDto {
    fn from(s: DrugStat) -> Self {
        Self {
            cip_code: s.cip_code,
            name: s.name,
            total_units: s.total_units,
            total_reimbursed: s.total_reimbursed,
        }
    }
}

// =============================================================================
// Reference data
// =============================================================================

/// A French administrative region.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegionDto {
    pub id: i32,
    pub code: i32,
    pub name: String,
}

impl From<Region> for RegionDto {
    fn from(r: Region) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
        }
    }
}

/// A drug of the catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct DrugDto {
    pub id: i32,
    pub cip_code: String,
    pub name: String,
}

impl From<Drug> for DrugDto {
    fn from(d: Drug) -> Self {
        Self {
            id: d.id,
            cip_code: d.cip_code,
            name: d.name,
        }
    }
}
