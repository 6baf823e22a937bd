//! Region reference endpoints.

use axum::{Json, extract::State};

use crate::dto::RegionDto;
use crate::error::ApiError;
use crate::extract::ValidPath;
use crate::state::AppState;

/// List all regions, ordered by code.
#[utoipa::path(
    get,
    path = "/api/v1/regions",
    responses(
        (status = 200, description = "All regions", body = Vec<RegionDto>),
    ),
    tag = "regions"
)]
pub async fn list_regions(State(state): State<AppState>) -> Result<Json<Vec<RegionDto>>, ApiError> {
    let regions = state.catalog_service.list_regions().await?;
    Ok(Json(regions.into_iter().map(RegionDto::from).collect()))
}

/// Get a region by id.
#[utoipa::path(
    get,
    path = "/api/v1/regions/{id}",
    params(
        ("id" = i32, Path, description = "Region id")
    ),
    responses(
        (status = 200, description = "Region found", body = RegionDto),
        (status = 404, description = "Region not found"),
    ),
    tag = "regions"
)]
pub async fn get_region(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
) -> Result<Json<RegionDto>, ApiError> {
    let region = state.catalog_service.region_by_id(id).await?;
    Ok(Json(RegionDto::from(region)))
}

/// Get a region by its administrative code.
#[utoipa::path(
    get,
    path = "/api/v1/regions/code/{code}",
    params(
        ("code" = i32, Path, description = "Region code (e.g. 11)")
    ),
    responses(
        (status = 200, description = "Region found", body = RegionDto),
        (status = 404, description = "Region not found"),
    ),
    tag = "regions"
)]
pub async fn get_region_by_code(
    State(state): State<AppState>,
    ValidPath(code): ValidPath<i32>,
) -> Result<Json<RegionDto>, ApiError> {
    let region = state.catalog_service.region_by_code(code).await?;
    Ok(Json(RegionDto::from(region)))
}
