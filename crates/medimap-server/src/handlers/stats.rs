//! Consumption statistics endpoints.

use axum::{Json, extract::State};

use medimap_core::validate::clamp_limit;

use crate::dto::{
    ComparisonResponse, DEFAULT_TOP_DRUGS, DrugStatDto, DrugTotalsQuery, MAX_TOP_DRUGS,
    OverviewResponse, RegionDetailResponse, RegionShareDto, RegionStatDto, YearQuery,
};
use crate::error::ApiError;
use crate::extract::{ValidPath, ValidQuery};
use crate::state::AppState;

/// National overview.
///
/// Returns national totals for the year along with region and drug counts.
#[utoipa::path(
    get,
    path = "/api/v1/stats/overview",
    params(YearQuery),
    responses(
        (status = 200, description = "National totals", body = OverviewResponse),
        (status = 422, description = "Year out of range"),
        (status = 503, description = "Database unavailable"),
    ),
    tag = "stats"
)]
pub async fn overview(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<YearQuery>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let year = state.year(params.year)?;
    let overview = state.stats_service.national_overview(year).await?;

    Ok(Json(OverviewResponse::from(overview)))
}

/// Region totals.
///
/// Returns every region with data for the year, ranked by reimbursed amount.
#[utoipa::path(
    get,
    path = "/api/v1/stats/regions",
    params(YearQuery),
    responses(
        (status = 200, description = "Regions ranked by reimbursement", body = Vec<RegionStatDto>),
        (status = 422, description = "Year out of range"),
    ),
    tag = "stats"
)]
pub async fn region_totals(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<YearQuery>,
) -> Result<Json<Vec<RegionStatDto>>, ApiError> {
    let year = state.year(params.year)?;
    let totals = state.stats_service.region_totals(year).await?;

    Ok(Json(totals.into_iter().map(RegionStatDto::from).collect()))
}

/// Totals of one region.
#[utoipa::path(
    get,
    path = "/api/v1/stats/regions/{code}",
    params(
        ("code" = i32, Path, description = "Region code (e.g. 11)"),
        YearQuery,
    ),
    responses(
        (status = 200, description = "Region totals", body = RegionDetailResponse),
        (status = 404, description = "Unknown region code"),
        (status = 422, description = "Year out of range"),
    ),
    tag = "stats"
)]
pub async fn region_detail(
    State(state): State<AppState>,
    ValidPath(code): ValidPath<i32>,
    ValidQuery(params): ValidQuery<YearQuery>,
) -> Result<Json<RegionDetailResponse>, ApiError> {
    let year = state.year(params.year)?;
    let detail = state.stats_service.region_detail(code, year).await?;

    Ok(Json(RegionDetailResponse::from(detail)))
}

/// Region against the national mean.
///
/// The percentage is null, with `percent_difference_defined` false, when the
/// mean is zero.
#[utoipa::path(
    get,
    path = "/api/v1/stats/regions/{code}/comparison",
    params(
        ("code" = i32, Path, description = "Region code (e.g. 93)"),
        YearQuery,
    ),
    responses(
        (status = 200, description = "Comparison to the mean of all regions", body = ComparisonResponse),
        (status = 404, description = "Unknown region code"),
        (status = 422, description = "Year out of range"),
    ),
    tag = "stats"
)]
pub async fn comparison(
    State(state): State<AppState>,
    ValidPath(code): ValidPath<i32>,
    ValidQuery(params): ValidQuery<YearQuery>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let year = state.year(params.year)?;
    let comparison = state.stats_service.compare_to_national(code, year).await?;

    Ok(Json(ComparisonResponse::from(comparison)))
}

/// Regional shares of the national reimbursement.
#[utoipa::path(
    get,
    path = "/api/v1/stats/shares",
    params(YearQuery),
    responses(
        (status = 200, description = "Regions with their share of the national total", body = Vec<RegionShareDto>),
        (status = 422, description = "Year out of range"),
    ),
    tag = "stats"
)]
pub async fn region_shares(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<YearQuery>,
) -> Result<Json<Vec<RegionShareDto>>, ApiError> {
    let year = state.year(params.year)?;
    let shares = state.stats_service.region_shares(year).await?;

    Ok(Json(shares.into_iter().map(RegionShareDto::from).collect()))
}

/// Drugs ranked by reimbursed amount.
#[utoipa::path(
    get,
    path = "/api/v1/stats/drugs",
    params(DrugTotalsQuery),
    responses(
        (status = 200, description = "Top drugs by reimbursement", body = Vec<DrugStatDto>),
        (status = 422, description = "Year out of range or zero limit"),
    ),
    tag = "stats"
)]
pub async fn drug_totals(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<DrugTotalsQuery>,
) -> Result<Json<Vec<DrugStatDto>>, ApiError> {
    let year = state.year(params.year)?;
    let limit = clamp_limit(params.limit, DEFAULT_TOP_DRUGS, MAX_TOP_DRUGS)?;
    let totals = state.stats_service.drug_totals(year, limit).await?;

    Ok(Json(totals.into_iter().map(DrugStatDto::from).collect()))
}
