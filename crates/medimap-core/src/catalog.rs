//! Reference data lookups: regions and the drug catalog.

use crate::error::AppError;
use crate::models::{Drug, Region};
use crate::traits::{ConsumptionStore, DrugFilter};
use crate::validate::validate_skip;

/// Default page size of [`CatalogService::list_drugs`].
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Largest page [`CatalogService::list_drugs`] returns.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Catalog service over a [`ConsumptionStore`].
pub struct CatalogService<S>
where
    S: ConsumptionStore,
{
    store: S,
}

impl<S> Clone for CatalogService<S>
where
    S: ConsumptionStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> CatalogService<S>
where
    S: ConsumptionStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All regions, ordered by code.
    pub async fn list_regions(&self) -> Result<Vec<Region>, AppError> {
        self.store.query_regions().await
    }

    pub async fn region_by_id(&self, id: i32) -> Result<Region, AppError> {
        self.store
            .query_region_by_id(id)
            .await?
            .ok_or(AppError::RegionIdNotFound(id))
    }

    pub async fn region_by_code(&self, code: i32) -> Result<Region, AppError> {
        self.store
            .query_region_by_code(code)
            .await?
            .ok_or(AppError::RegionNotFound(code))
    }

    /// A page of the drug catalog ordered by id. `limit` is capped at [`MAX_LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// [`AppError::ValidationError`] if `skip` exceeds `i64::MAX`.
    pub async fn list_drugs(&self, skip: usize, limit: usize) -> Result<Vec<Drug>, AppError> {
        let skip = validate_skip(skip)?;
        self.store
            .query_drugs(&DrugFilter::default(), limit.min(MAX_LIST_LIMIT), skip)
            .await
    }

    pub async fn drug_by_id(&self, id: i32) -> Result<Drug, AppError> {
        self.store
            .query_drug_by_id(id)
            .await?
            .ok_or(AppError::DrugNotFound(id))
    }

    /// Checks that the underlying store answers.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.store.health_check().await
    }
}
