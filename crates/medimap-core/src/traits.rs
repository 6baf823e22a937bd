//! Trait definitions for the storage seams.
//!
//! The aggregation engine and the batch loader never talk to PostgreSQL
//! directly. They go through these traits, which enables:
//!
//! - **Testability**: in-memory implementations for unit and integration tests
//! - **Explicit injection**: every service receives its store handle at construction,
//!   there is no process-wide connection singleton
//! - **Read/write separation**: the API only ever holds a [`ConsumptionStore`];
//!   [`LoadSink`] is used by the batch loader alone
//!
//! # Example
//!
//! ```
//! use medimap_core::traits::{ConsumptionStore, FactFilter};
//! use medimap_core::{AppError, ConsumptionFact};
//!
//! async fn facts_for<S: ConsumptionStore>(
//!     store: &S,
//!     year: i32,
//! ) -> Result<Vec<ConsumptionFact>, AppError> {
//!     store.query_facts(&FactFilter::region_aggregates(year)).await
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;

use crate::AppError;
use crate::models::{
    ConsumptionFact, Drug, NewConsumptionFact, NewDrug, NewRegion, NewTherapeuticClass, Region,
    TableCounts,
};

/// Granularity selector for consumption facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactScope {
    /// Every row regardless of `drug_id`.
    #[default]
    Any,
    /// Region-level aggregates only (`drug_id IS NULL`).
    RegionAggregate,
    /// Per-drug rows only (`drug_id IS NOT NULL`).
    AnyDrug,
    /// Rows for one drug.
    Drug(i32),
}

impl FactScope {
    /// Returns true if a row with this `drug_id` falls inside the scope.
    pub fn matches(&self, drug_id: Option<i32>) -> bool {
        match self {
            FactScope::Any => true,
            FactScope::RegionAggregate => drug_id.is_none(),
            FactScope::AnyDrug => drug_id.is_some(),
            FactScope::Drug(id) => drug_id == Some(*id),
        }
    }
}

/// Filter for [`ConsumptionStore::query_facts`]. Unset fields do not filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactFilter {
    pub year: Option<i32>,
    pub region_id: Option<i32>,
    pub scope: FactScope,
}

impl FactFilter {
    /// Region-level aggregate rows for `year`.
    pub fn region_aggregates(year: i32) -> Self {
        Self {
            year: Some(year),
            region_id: None,
            scope: FactScope::RegionAggregate,
        }
    }

    /// Per-drug rows for `year`.
    pub fn drug_rows(year: i32) -> Self {
        Self {
            year: Some(year),
            region_id: None,
            scope: FactScope::AnyDrug,
        }
    }

    /// Restricts the filter to one region.
    pub fn with_region(mut self, region_id: i32) -> Self {
        self.region_id = Some(region_id);
        self
    }

    /// Returns true if `fact` passes every set criterion.
    pub fn matches(&self, fact: &ConsumptionFact) -> bool {
        self.year.is_none_or(|y| fact.year == y)
            && self.region_id.is_none_or(|r| fact.region_id == Some(r))
            && self.scope.matches(fact.drug_id)
    }
}

/// Filter for [`ConsumptionStore::query_drugs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugFilter {
    /// Case-insensitive substring of the drug name.
    pub name_contains: Option<String>,
}

impl DrugFilter {
    pub fn name_contains(term: impl Into<String>) -> Self {
        Self {
            name_contains: Some(term.into()),
        }
    }
}

/// Read access to consumption facts and reference data.
///
/// Every method is a read. Implementations must return rows in the documented
/// order so that results are stable for identical store state.
pub trait ConsumptionStore: Send + Sync + Clone {
    /// Returns the facts matching `filter`, ordered by id.
    fn query_facts(
        &self,
        filter: &FactFilter,
    ) -> impl Future<Output = Result<Vec<ConsumptionFact>, AppError>> + Send;

    /// Returns all regions ordered by code.
    fn query_regions(&self) -> impl Future<Output = Result<Vec<Region>, AppError>> + Send;

    /// Looks up a region by its stable code.
    fn query_region_by_code(
        &self,
        code: i32,
    ) -> impl Future<Output = Result<Option<Region>, AppError>> + Send;

    /// Looks up a region by its internal id.
    fn query_region_by_id(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Option<Region>, AppError>> + Send;

    /// Returns drugs matching `filter`, ordered by id, after skipping `offset` rows.
    fn query_drugs(
        &self,
        filter: &DrugFilter,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<Drug>, AppError>> + Send;

    /// Looks up a drug by its internal id.
    fn query_drug_by_id(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Option<Drug>, AppError>> + Send;

    /// Returns the size of the drug catalog.
    fn count_drugs(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Checks store connectivity.
    fn health_check(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Write access used by the batch loader.
///
/// Reference inserts are idempotent on their unique codes: re-inserting an
/// existing code is a no-op, not an error.
pub trait LoadSink: Send + Sync + Clone {
    /// Inserts regions; returns the number of rows actually added.
    fn insert_regions(
        &self,
        regions: &[NewRegion],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Inserts drugs; returns the number of rows actually added.
    fn insert_drugs(&self, drugs: &[NewDrug])
    -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Inserts therapeutic classes; returns the number of rows actually added.
    fn insert_classes(
        &self,
        classes: &[NewTherapeuticClass],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Returns a map from region code to internal id.
    fn region_ids_by_code(
        &self,
    ) -> impl Future<Output = Result<HashMap<i32, i32>, AppError>> + Send;

    /// Counts region-level aggregate facts already stored for `year`.
    fn count_aggregate_facts(&self, year: i32)
    -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Swaps the region-level aggregate facts of `year` for `facts` atomically.
    ///
    /// Readers see either the old rows or the new ones, never an empty year.
    /// Returns `(deleted, inserted)`.
    fn replace_aggregate_facts(
        &self,
        year: i32,
        facts: &[NewConsumptionFact],
    ) -> impl Future<Output = Result<(u64, u64), AppError>> + Send;

    /// Inserts facts; returns the number of rows added.
    fn insert_facts(
        &self,
        facts: &[NewConsumptionFact],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Returns current row counts of all tables.
    fn table_counts(&self) -> impl Future<Output = Result<TableCounts, AppError>> + Send;
}
