//! Test utilities and mock implementations for integration tests.
//!
//! [`MockStore`] keeps all four tables in memory and implements both
//! [`ConsumptionStore`] and [`LoadSink`], so a test can load data through
//! `LoadService` and read it back through `StatsService`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use medimap_core::traits::{ConsumptionStore, DrugFilter, FactFilter, LoadSink};
use medimap_core::{
    AppError, ConsumptionFact, Drug, NewConsumptionFact, NewDrug, NewRegion, NewTherapeuticClass,
    Region, TableCounts, TherapeuticClass,
};
use rust_decimal::Decimal;

// =============================================================================
// MockStore
// =============================================================================

#[derive(Default)]
struct Tables {
    regions: Vec<Region>,
    drugs: Vec<Drug>,
    classes: Vec<TherapeuticClass>,
    facts: Vec<ConsumptionFact>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn push_fact(&mut self, fact: &NewConsumptionFact) {
        let id = self.next_id();
        self.facts.push(ConsumptionFact {
            id,
            region_id: fact.region_id,
            drug_id: fact.drug_id,
            year: fact.year,
            total_units: fact.total_units,
            total_reimbursed: fact.total_reimbursed,
        });
    }
}

/// In-memory store for testing.
#[derive(Clone, Default)]
pub struct MockStore {
    tables: Arc<Mutex<Tables>>,
    /// Number of fact writes, to check that rejected loads write nothing.
    pub fact_inserts: Arc<AtomicUsize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region and returns its id.
    pub fn add_region(&self, code: i32, name: &str) -> i32 {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.regions.push(Region {
            id,
            code,
            name: name.to_string(),
        });
        id
    }

    /// Adds a drug and returns its id.
    pub fn add_drug(&self, cip_code: &str, name: &str) -> i32 {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.drugs.push(Drug {
            id,
            cip_code: cip_code.to_string(),
            name: name.to_string(),
        });
        id
    }

    /// Adds a fact; `reimbursed` is given in cents.
    pub fn add_fact(
        &self,
        region_id: Option<i32>,
        drug_id: Option<i32>,
        year: i32,
        units: i64,
        reimbursed_cents: i64,
    ) {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.facts.push(ConsumptionFact {
            id,
            region_id,
            drug_id,
            year,
            total_units: units,
            total_reimbursed: Decimal::new(reimbursed_cents, 2),
        });
    }

    /// Adds a region with one region-level aggregate fact for `year`.
    pub fn add_region_total(&self, code: i32, name: &str, year: i32, units: i64, cents: i64) -> i32 {
        let id = self.add_region(code, name);
        self.add_fact(Some(id), None, year, units, cents);
        id
    }

    pub fn facts(&self) -> Vec<ConsumptionFact> {
        self.tables.lock().unwrap().facts.clone()
    }

    pub fn classes(&self) -> Vec<TherapeuticClass> {
        self.tables.lock().unwrap().classes.clone()
    }
}

impl ConsumptionStore for MockStore {
    async fn query_facts(&self, filter: &FactFilter) -> Result<Vec<ConsumptionFact>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut facts: Vec<ConsumptionFact> = tables
            .facts
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        facts.sort_by_key(|f| f.id);
        Ok(facts)
    }

    async fn query_regions(&self) -> Result<Vec<Region>, AppError> {
        let mut regions = self.tables.lock().unwrap().regions.clone();
        regions.sort_by_key(|r| r.code);
        Ok(regions)
    }

    async fn query_region_by_code(&self, code: i32) -> Result<Option<Region>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.regions.iter().find(|r| r.code == code).cloned())
    }

    async fn query_region_by_id(&self, id: i32) -> Result<Option<Region>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.regions.iter().find(|r| r.id == id).cloned())
    }

    async fn query_drugs(
        &self,
        filter: &DrugFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Drug>, AppError> {
        let tables = self.tables.lock().unwrap();
        let needle = filter.name_contains.as_deref().map(str::to_lowercase);
        let mut drugs: Vec<Drug> = tables
            .drugs
            .iter()
            .filter(|d| {
                needle
                    .as_deref()
                    .is_none_or(|n| d.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        drugs.sort_by_key(|d| d.id);
        Ok(drugs.into_iter().skip(offset).take(limit).collect())
    }

    async fn query_drug_by_id(&self, id: i32) -> Result<Option<Drug>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.drugs.iter().find(|d| d.id == id).cloned())
    }

    async fn count_drugs(&self) -> Result<i64, AppError> {
        Ok(self.tables.lock().unwrap().drugs.len() as i64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

impl LoadSink for MockStore {
    async fn insert_regions(&self, regions: &[NewRegion]) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let mut added = 0;
        for region in regions {
            if tables.regions.iter().any(|r| r.code == region.code) {
                continue;
            }
            let id = tables.next_id();
            tables.regions.push(Region {
                id,
                code: region.code,
                name: region.name.clone(),
            });
            added += 1;
        }
        Ok(added)
    }

    async fn insert_drugs(&self, drugs: &[NewDrug]) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let mut added = 0;
        for drug in drugs {
            if tables.drugs.iter().any(|d| d.cip_code == drug.cip_code) {
                continue;
            }
            let id = tables.next_id();
            tables.drugs.push(Drug {
                id,
                cip_code: drug.cip_code.clone(),
                name: drug.name.clone(),
            });
            added += 1;
        }
        Ok(added)
    }

    async fn insert_classes(&self, classes: &[NewTherapeuticClass]) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let mut added = 0;
        for class in classes {
            if tables.classes.iter().any(|c| c.atc_code == class.atc_code) {
                continue;
            }
            let id = tables.next_id();
            tables.classes.push(TherapeuticClass {
                id,
                atc_code: class.atc_code.clone(),
                name: class.name.clone(),
            });
            added += 1;
        }
        Ok(added)
    }

    async fn region_ids_by_code(&self) -> Result<HashMap<i32, i32>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.regions.iter().map(|r| (r.code, r.id)).collect())
    }

    async fn count_aggregate_facts(&self, year: i32) -> Result<i64, AppError> {
        let filter = FactFilter::region_aggregates(year);
        let tables = self.tables.lock().unwrap();
        Ok(tables.facts.iter().filter(|f| filter.matches(f)).count() as i64)
    }

    async fn replace_aggregate_facts(
        &self,
        year: i32,
        facts: &[NewConsumptionFact],
    ) -> Result<(u64, u64), AppError> {
        self.fact_inserts.fetch_add(1, Ordering::SeqCst);
        let filter = FactFilter::region_aggregates(year);
        let mut tables = self.tables.lock().unwrap();
        let before = tables.facts.len();
        tables.facts.retain(|f| !filter.matches(f));
        let deleted = (before - tables.facts.len()) as u64;
        for fact in facts {
            tables.push_fact(fact);
        }
        Ok((deleted, facts.len() as u64))
    }

    async fn insert_facts(&self, facts: &[NewConsumptionFact]) -> Result<u64, AppError> {
        self.fact_inserts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        for fact in facts {
            tables.push_fact(fact);
        }
        Ok(facts.len() as u64)
    }

    async fn table_counts(&self) -> Result<TableCounts, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(TableCounts {
            regions: tables.regions.len() as i64,
            drugs: tables.drugs.len() as i64,
            therapeutic_classes: tables.classes.len() as i64,
            consumption_facts: tables.facts.len() as i64,
        })
    }
}

// =============================================================================
// FailingStore
// =============================================================================

/// Store whose every read fails, simulating an unreachable database.
#[derive(Clone, Default)]
pub struct FailingStore;

fn unavailable<T>() -> Result<T, AppError> {
    Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
}

impl ConsumptionStore for FailingStore {
    async fn query_facts(&self, _filter: &FactFilter) -> Result<Vec<ConsumptionFact>, AppError> {
        unavailable()
    }

    async fn query_regions(&self) -> Result<Vec<Region>, AppError> {
        unavailable()
    }

    async fn query_region_by_code(&self, _code: i32) -> Result<Option<Region>, AppError> {
        unavailable()
    }

    async fn query_region_by_id(&self, _id: i32) -> Result<Option<Region>, AppError> {
        unavailable()
    }

    async fn query_drugs(
        &self,
        _filter: &DrugFilter,
        _limit: usize,
        _offset: usize,
    ) -> Result<Vec<Drug>, AppError> {
        unavailable()
    }

    async fn query_drug_by_id(&self, _id: i32) -> Result<Option<Drug>, AppError> {
        unavailable()
    }

    async fn count_drugs(&self) -> Result<i64, AppError> {
        unavailable()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        unavailable()
    }
}

// =============================================================================
// EmptyScanStore
// =============================================================================

/// Wraps a [`MockStore`] whose year-wide fact scans come back empty while
/// per-region reads still see the rows, as when a replace lands between two
/// reads.
#[derive(Clone)]
pub struct EmptyScanStore(pub MockStore);

impl ConsumptionStore for EmptyScanStore {
    async fn query_facts(&self, filter: &FactFilter) -> Result<Vec<ConsumptionFact>, AppError> {
        if filter.region_id.is_none() {
            return Ok(Vec::new());
        }
        self.0.query_facts(filter).await
    }

    async fn query_regions(&self) -> Result<Vec<Region>, AppError> {
        self.0.query_regions().await
    }

    async fn query_region_by_code(&self, code: i32) -> Result<Option<Region>, AppError> {
        self.0.query_region_by_code(code).await
    }

    async fn query_region_by_id(&self, id: i32) -> Result<Option<Region>, AppError> {
        self.0.query_region_by_id(id).await
    }

    async fn query_drugs(
        &self,
        filter: &DrugFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Drug>, AppError> {
        self.0.query_drugs(filter, limit, offset).await
    }

    async fn query_drug_by_id(&self, id: i32) -> Result<Option<Drug>, AppError> {
        self.0.query_drug_by_id(id).await
    }

    async fn count_drugs(&self) -> Result<i64, AppError> {
        self.0.count_drugs().await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.0.health_check().await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Two regions: Île-de-France (code 11, 1000 units, 5000.00 EUR) and
/// Provence-Alpes-Côte d'Azur (code 93, 400 units, 1200.00 EUR), year 2023.
pub fn two_region_store() -> MockStore {
    let store = MockStore::new();
    store.add_region_total(11, "Île-de-France", 2023, 1000, 500_000);
    store.add_region_total(93, "Provence-Alpes-Côte d'Azur", 2023, 400, 120_000);
    store
}
