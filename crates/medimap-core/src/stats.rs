//! Aggregation engine.
//!
//! [`StatsService`] turns raw consumption facts into the ranked statistics
//! served by the API: per-region totals, a national overview, region-vs-mean
//! comparisons, shares of the national total and per-drug totals.
//!
//! Every operation is a read. Grouping and ranking happen here rather than in
//! SQL so that any [`ConsumptionStore`] yields the same results, including the
//! in-memory stores used in tests.
//!
//! # Granularity
//!
//! Region statistics fold only region-level aggregate rows (`drug_id IS NULL`),
//! and [`StatsService::drug_totals`] folds only per-drug rows. Loading both
//! granularities for the same region and year therefore never double counts.
//! Facts without a region cannot be attributed and are left out of region
//! statistics.
//!
//! # Example
//!
//! ```ignore
//! use medimap_core::StatsService;
//!
//! let stats = StatsService::new(store);
//! for (i, region) in stats.region_totals(2023).await?.iter().enumerate() {
//!     println!("{}. {} {}", i + 1, region.name, region.total_reimbursed);
//! }
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::future::try_join_all;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::AppError;
use crate::models::{
    Comparison, ConsumptionFact, DrugStat, Overview, Ratio, Region, RegionDetail, RegionShare,
    RegionStat, round_currency,
};
use crate::traits::{ConsumptionStore, DrugFilter, FactFilter};

/// Read-only statistics over a [`ConsumptionStore`].
pub struct StatsService<S>
where
    S: ConsumptionStore,
{
    store: S,
}

impl<S> Clone for StatsService<S>
where
    S: ConsumptionStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> StatsService<S>
where
    S: ConsumptionStore,
{
    /// Creates a new statistics service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns per-region totals for `year`, highest reimbursement first.
    ///
    /// Ties are broken by region code ascending, so identical store state
    /// always yields the identical sequence. A year without facts yields an
    /// empty sequence.
    pub async fn region_totals(&self, year: i32) -> Result<Vec<RegionStat>, AppError> {
        let filter = FactFilter::region_aggregates(year);
        let (facts, regions) =
            futures::try_join!(self.store.query_facts(&filter), self.store.query_regions())?;

        let totals = fold_region_totals(&facts, &regions);
        debug!(year, regions = totals.len(), "Computed region totals");
        Ok(totals)
    }

    /// Returns the totals of one region for `year`.
    ///
    /// A known region without facts for the year yields zero totals.
    ///
    /// # Errors
    ///
    /// [`AppError::RegionNotFound`] if no region carries `code`, whether or
    /// not facts exist for the year.
    pub async fn region_detail(&self, code: i32, year: i32) -> Result<RegionDetail, AppError> {
        let region = self
            .store
            .query_region_by_code(code)
            .await?
            .ok_or(AppError::RegionNotFound(code))?;

        let filter = FactFilter::region_aggregates(year).with_region(region.id);
        let facts = self.store.query_facts(&filter).await?;
        let (total_units, total_reimbursed) = sum_facts(facts.iter());

        Ok(RegionDetail {
            code: region.code,
            name: region.name,
            year,
            total_units,
            total_reimbursed,
        })
    }

    /// Returns national totals for `year`.
    ///
    /// Derived from the same fold as [`region_totals`](Self::region_totals), so
    /// the national reimbursement always equals the sum over regions. The drug
    /// count covers the whole catalog regardless of year.
    pub async fn national_overview(&self, year: i32) -> Result<Overview, AppError> {
        let (totals, drug_count) =
            futures::try_join!(self.region_totals(year), self.store.count_drugs())?;

        let (total_units, total_reimbursed) = sum_stats(&totals);

        Ok(Overview {
            year,
            total_units,
            total_reimbursed,
            region_count: totals.len() as i64,
            drug_count,
        })
    }

    /// Compares one region's reimbursement with the mean over all regions.
    ///
    /// The region value, mean, rank and count all come from one
    /// [`region_totals`](Self::region_totals) fold, so they always agree. The
    /// percentage is [`Ratio::Undefined`] when the mean is zero. A known region
    /// without facts in `year` has a zero value and no rank.
    ///
    /// # Errors
    ///
    /// [`AppError::RegionNotFound`] for an unknown region code.
    pub async fn compare_to_national(&self, code: i32, year: i32) -> Result<Comparison, AppError> {
        let (region, totals) = futures::try_join!(
            self.store.query_region_by_code(code),
            self.region_totals(year)
        )?;
        let region = region.ok_or(AppError::RegionNotFound(code))?;

        let region_count = totals.len();
        let (_, national_total) = sum_stats(&totals);
        let national_mean = if region_count == 0 {
            Decimal::ZERO
        } else {
            national_total / Decimal::from(region_count)
        };

        let position = totals.iter().position(|stat| stat.code == region.code);
        let region_value = position
            .map(|index| totals[index].total_reimbursed)
            .unwrap_or(Decimal::ZERO);
        let difference = region_value - national_mean;
        let percent_difference = Ratio::percent(difference, national_mean);

        Ok(Comparison {
            code: region.code,
            name: region.name,
            year,
            region_value,
            national_mean: round_currency(national_mean),
            difference: round_currency(difference),
            percent_difference,
            rank: position.map(|index| index + 1),
            region_count,
        })
    }

    /// Returns region totals with each region's share of the national reimbursement.
    pub async fn region_shares(&self, year: i32) -> Result<Vec<RegionShare>, AppError> {
        let totals = self.region_totals(year).await?;
        let (_, national_total) = sum_stats(&totals);

        Ok(totals
            .into_iter()
            .map(|stat| {
                let share_pct = Ratio::percent(stat.total_reimbursed, national_total);
                RegionShare { stat, share_pct }
            })
            .collect())
    }

    /// Returns the `limit` drugs with the highest reimbursement in `year`.
    ///
    /// Folds per-drug facts across regions; ties are broken by drug id.
    /// Facts pointing at a drug missing from the catalog are skipped.
    pub async fn drug_totals(&self, year: i32, limit: usize) -> Result<Vec<DrugStat>, AppError> {
        let facts = self.store.query_facts(&FactFilter::drug_rows(year)).await?;

        let mut sums: HashMap<i32, (i64, Decimal)> = HashMap::new();
        for fact in &facts {
            if let Some(drug_id) = fact.drug_id {
                let entry = sums.entry(drug_id).or_default();
                entry.0 += fact.total_units;
                entry.1 += fact.total_reimbursed;
            }
        }

        let mut ranked: Vec<(i32, i64, Decimal)> = sums
            .into_iter()
            .map(|(id, (units, reimbursed))| (id, units, reimbursed))
            .collect();
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let drugs = try_join_all(
            ranked
                .iter()
                .map(|(id, _, _)| self.store.query_drug_by_id(*id)),
        )
        .await?;

        Ok(ranked
            .into_iter()
            .zip(drugs)
            .filter_map(|((_, total_units, total_reimbursed), drug)| {
                drug.map(|d| DrugStat {
                    cip_code: d.cip_code,
                    name: d.name,
                    total_units,
                    total_reimbursed,
                })
            })
            .collect())
    }

    /// Case-insensitive substring search on drug names, at most `limit` results.
    ///
    /// The term is expected to be validated already, see
    /// [`validate_search_term`](crate::validate::validate_search_term).
    pub async fn drug_search(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<crate::models::Drug>, AppError> {
        self.store
            .query_drugs(&DrugFilter::name_contains(term), limit, 0)
            .await
    }
}

/// Groups region-level facts by region and ranks the result.
///
/// Facts whose region is unknown or missing are ignored.
pub fn fold_region_totals(facts: &[ConsumptionFact], regions: &[Region]) -> Vec<RegionStat> {
    let regions_by_id: HashMap<i32, &Region> = regions.iter().map(|r| (r.id, r)).collect();
    let mut sums: HashMap<i32, (i64, Decimal)> = HashMap::new();

    for fact in facts {
        let Some(region_id) = fact.region_id else {
            continue;
        };
        if !regions_by_id.contains_key(&region_id) {
            debug!(region_id, fact_id = fact.id, "Skipping fact for unknown region");
            continue;
        }
        let entry = sums.entry(region_id).or_default();
        entry.0 += fact.total_units;
        entry.1 += fact.total_reimbursed;
    }

    let mut totals: Vec<RegionStat> = sums
        .into_iter()
        .filter_map(|(region_id, (total_units, total_reimbursed))| {
            regions_by_id.get(&region_id).map(|region| RegionStat {
                code: region.code,
                name: region.name.clone(),
                total_units,
                total_reimbursed,
            })
        })
        .collect();

    totals.sort_by(compare_by_reimbursement);
    totals
}

/// Ordering used for every region ranking: reimbursement descending, then code ascending.
pub fn compare_by_reimbursement(a: &RegionStat, b: &RegionStat) -> Ordering {
    b.total_reimbursed
        .cmp(&a.total_reimbursed)
        .then(a.code.cmp(&b.code))
}

fn sum_facts<'a>(facts: impl Iterator<Item = &'a ConsumptionFact>) -> (i64, Decimal) {
    facts.fold((0, Decimal::ZERO), |(units, reimbursed), fact| {
        (units + fact.total_units, reimbursed + fact.total_reimbursed)
    })
}

fn sum_stats(stats: &[RegionStat]) -> (i64, Decimal) {
    stats.iter().fold((0, Decimal::ZERO), |(units, reimbursed), s| {
        (units + s.total_units, reimbursed + s.total_reimbursed)
    })
}
