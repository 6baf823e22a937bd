//! Drug catalog endpoints.

use axum::{Json, extract::State};

use medimap_core::catalog::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use medimap_core::validate::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, clamp_limit};
use medimap_core::validate_search_term;

use crate::dto::{DrugDto, DrugSearchQuery, PageQuery};
use crate::error::ApiError;
use crate::extract::{ValidPath, ValidQuery};
use crate::state::AppState;

/// Search drugs by name.
///
/// Case-insensitive substring match. Terms shorter than three characters,
/// after trimming, are rejected.
#[utoipa::path(
    get,
    path = "/api/v1/drugs/search",
    params(DrugSearchQuery),
    responses(
        (status = 200, description = "Matching drugs, ordered by id", body = Vec<DrugDto>),
        (status = 422, description = "Search term too short or zero limit"),
    ),
    tag = "drugs"
)]
pub async fn search(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<DrugSearchQuery>,
) -> Result<Json<Vec<DrugDto>>, ApiError> {
    let term = validate_search_term(&params.q)?;
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT)?;

    let drugs = state.stats_service.drug_search(term, limit).await?;
    tracing::debug!(term, results = drugs.len(), "Drug search");

    Ok(Json(drugs.into_iter().map(DrugDto::from).collect()))
}

/// Page through the drug catalog.
#[utoipa::path(
    get,
    path = "/api/v1/drugs",
    params(PageQuery),
    responses(
        (status = 200, description = "Drugs ordered by id", body = Vec<DrugDto>),
        (status = 422, description = "Zero limit"),
    ),
    tag = "drugs"
)]
pub async fn list_drugs(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PageQuery>,
) -> Result<Json<Vec<DrugDto>>, ApiError> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT)?;
    let drugs = state
        .catalog_service
        .list_drugs(params.skip.unwrap_or(0), limit)
        .await?;

    Ok(Json(drugs.into_iter().map(DrugDto::from).collect()))
}

/// Get a drug by id.
#[utoipa::path(
    get,
    path = "/api/v1/drugs/{id}",
    params(
        ("id" = i32, Path, description = "Drug id")
    ),
    responses(
        (status = 200, description = "Drug found", body = DrugDto),
        (status = 404, description = "Drug not found"),
    ),
    tag = "drugs"
)]
pub async fn get_drug(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
) -> Result<Json<DrugDto>, ApiError> {
    let drug = state.catalog_service.drug_by_id(id).await?;
    Ok(Json(DrugDto::from(drug)))
}
