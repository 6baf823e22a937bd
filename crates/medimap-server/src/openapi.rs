//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::dto::{
    ComparisonResponse, DrugDto, DrugSearchQuery, DrugStatDto, DrugTotalsQuery, HealthResponse,
    OverviewResponse, PageQuery, RegionDetailResponse, RegionDto, RegionShareDto, RegionStatDto,
    ServiceInfoResponse, ServiceStatus, YearQuery,
};
use crate::error::ErrorResponse;
use crate::handlers::{drugs, health, info, regions, stats};

/// OpenAPI documentation for the MediMap API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediMap API",
        version = "1.0.0",
        description = "Territorial statistics of reimbursed drug consumption in France.

MediMap aggregates yearly drug dispensation and reimbursement figures per
administrative region and exposes them read-only.

## Features

- **Overview**: national totals for a year
- **Regions**: totals per region, ranked by reimbursed amount
- **Comparison**: a region against the mean of all regions
- **Drugs**: catalog lookups and name search

Amounts are euros encoded as decimal strings (`\"5000.00\"`).

## Quick Start

1. Check server health: `GET /api/v1/health`
2. National totals: `GET /api/v1/stats/overview?year=2023`
3. Compare a region: `GET /api/v1/stats/regions/93/comparison?year=2023`
",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        info::service_info,
        health::health_check,
        stats::overview,
        stats::region_totals,
        stats::region_detail,
        stats::comparison,
        stats::region_shares,
        stats::drug_totals,
        drugs::search,
        drugs::list_drugs,
        drugs::get_drug,
        regions::list_regions,
        regions::get_region,
        regions::get_region_by_code,
    ),
    components(
        schemas(
            // Request types
            YearQuery,
            DrugTotalsQuery,
            DrugSearchQuery,
            PageQuery,
            // Response types
            ServiceInfoResponse,
            HealthResponse,
            ServiceStatus,
            OverviewResponse,
            RegionStatDto,
            RegionDetailResponse,
            ComparisonResponse,
            RegionShareDto,
            DrugStatDto,
            DrugDto,
            RegionDto,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "Service description and health"),
        (name = "stats", description = "Consumption statistics"),
        (name = "drugs", description = "Drug catalog and search"),
        (name = "regions", description = "Region reference data"),
    )
)]
pub struct ApiDoc;
