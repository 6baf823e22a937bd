//! Batch loader for pre-aggregated consumption extracts.
//!
//! Reads the three CSV files produced by the upstream pre-aggregation step,
//! validates them and writes reference data plus one region-level aggregate
//! fact per region into a [`LoadSink`].
//!
//! # Flow
//!
//! 1. Parse regions, drugs and therapeutic classes ([`read_sources`])
//! 2. Validate totals and region codes ([`LoadInput::validate`])
//! 3. Refuse to load a year twice unless `replace` is set
//! 4. Insert reference data (idempotent), then the facts
//!
//! Reference inserts are separate idempotent calls. The facts of a year are
//! written by one final call; with `replace` the old rows are swapped out in
//! the same transaction, so readers never observe a half-replaced year.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SourcesConfig;
use crate::error::AppError;
use crate::models::{NewConsumptionFact, NewDrug, NewRegion, NewTherapeuticClass, TableCounts};
use crate::traits::LoadSink;

// =============================================================================
// CSV rows
// =============================================================================

/// One row of the per-region aggregate file.
///
/// Column names follow the upstream extract; extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionTotalsRow {
    #[serde(rename = "code_region")]
    pub code: i32,
    #[serde(rename = "nom_region")]
    pub name: String,
    /// Number of packages. Read as a decimal since some exports write `1234.0`.
    #[serde(rename = "total_boites", deserialize_with = "decimal_field")]
    pub total_units: Decimal,
    #[serde(rename = "total_remb", deserialize_with = "decimal_field")]
    pub total_reimbursed: Decimal,
}

/// Parses the raw field text so amounts never go through `f64`.
fn decimal_field<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| de::Error::custom(format!("invalid decimal '{}'", raw)))
}

#[derive(Debug, Deserialize)]
struct DrugRow {
    code_cip: String,
    nom_medicament: String,
}

#[derive(Debug, Deserialize)]
struct ClassRow {
    code_atc: String,
    classe_therapeutique: String,
}

/// Parses the per-region aggregate file.
pub fn parse_regions<R: Read>(reader: R) -> Result<Vec<RegionTotalsRow>, AppError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Parses the drug list, keeping the first occurrence of each CIP code.
pub fn parse_drugs<R: Read>(reader: R) -> Result<Vec<NewDrug>, AppError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen = HashSet::new();
    let mut drugs = Vec::new();
    for record in rdr.deserialize() {
        let row: DrugRow = record?;
        if seen.insert(row.code_cip.clone()) {
            drugs.push(NewDrug {
                cip_code: row.code_cip,
                name: row.nom_medicament,
            });
        }
    }
    Ok(drugs)
}

/// Parses the therapeutic class list, keeping the first occurrence of each ATC code.
pub fn parse_classes<R: Read>(reader: R) -> Result<Vec<NewTherapeuticClass>, AppError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen = HashSet::new();
    let mut classes = Vec::new();
    for record in rdr.deserialize() {
        let row: ClassRow = record?;
        if seen.insert(row.code_atc.clone()) {
            classes.push(NewTherapeuticClass {
                atc_code: row.code_atc,
                name: row.classe_therapeutique,
            });
        }
    }
    Ok(classes)
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| {
        AppError::ConfigError(format!("Cannot open source file '{}': {}", path.display(), e))
    })
}

/// Reads and parses the three files named by `sources`.
pub fn read_sources(sources: &SourcesConfig) -> Result<LoadInput, AppError> {
    let regions = parse_regions(open(&sources.regions)?)?;
    let drugs = parse_drugs(open(&sources.drugs)?)?;
    let classes = parse_classes(open(&sources.classes)?)?;
    info!(
        regions = regions.len(),
        drugs = drugs.len(),
        classes = classes.len(),
        "Parsed source files"
    );
    Ok(LoadInput {
        regions,
        drugs,
        classes,
    })
}

// =============================================================================
// Load
// =============================================================================

/// Decimal places kept for reimbursed amounts.
const AMOUNT_SCALE: u32 = 2;

/// Parsed contents of one extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadInput {
    pub regions: Vec<RegionTotalsRow>,
    pub drugs: Vec<NewDrug>,
    pub classes: Vec<NewTherapeuticClass>,
}

impl LoadInput {
    /// Checks the region rows before anything is written.
    ///
    /// # Errors
    ///
    /// [`AppError::ValidationError`] on a repeated region code, an empty region
    /// name, a negative or fractional package count, or an amount that is
    /// negative or carries more than two decimals.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut codes = HashSet::new();
        for row in &self.regions {
            if !codes.insert(row.code) {
                return Err(AppError::ValidationError(format!(
                    "Region {} appears more than once in the aggregate file",
                    row.code
                )));
            }
            if row.name.trim().is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Region {} has an empty name",
                    row.code
                )));
            }
            units_of(row)?;
            if row.total_reimbursed.is_sign_negative() && !row.total_reimbursed.is_zero() {
                return Err(AppError::ValidationError(format!(
                    "Region {} has a negative reimbursed amount: {}",
                    row.code, row.total_reimbursed
                )));
            }
            // Amounts are stored as NUMERIC(15, 2); extra digits would be rounded away
            if row.total_reimbursed.normalize().scale() > AMOUNT_SCALE {
                return Err(AppError::ValidationError(format!(
                    "Region {} has more than two decimals in its reimbursed amount: {}",
                    row.code, row.total_reimbursed
                )));
            }
        }
        Ok(())
    }
}

fn units_of(row: &RegionTotalsRow) -> Result<i64, AppError> {
    if !row.total_units.fract().is_zero() {
        return Err(AppError::ValidationError(format!(
            "Region {} has a fractional package count: {}",
            row.code, row.total_units
        )));
    }
    match row.total_units.to_i64() {
        Some(units) if units >= 0 => Ok(units),
        _ => Err(AppError::ValidationError(format!(
            "Region {} has an invalid package count: {}",
            row.code, row.total_units
        ))),
    }
}

/// Options of one load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Year assigned to the loaded facts.
    pub year: i32,
    /// Delete existing aggregate facts of `year` instead of refusing to load.
    pub replace: bool,
    /// Parse and validate only.
    pub dry_run: bool,
}

impl LoadOptions {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            replace: false,
            dry_run: false,
        }
    }
}

/// Outcome of a load run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub year: i32,
    pub dry_run: bool,
    pub regions_read: usize,
    pub regions_inserted: u64,
    pub drugs_read: usize,
    pub drugs_inserted: u64,
    pub classes_read: usize,
    pub classes_inserted: u64,
    /// Aggregate facts deleted because `replace` was set.
    pub facts_replaced: u64,
    pub facts_inserted: u64,
    /// Table sizes after the load; `None` for a dry run.
    pub counts: Option<TableCounts>,
}

/// Loader service over a [`LoadSink`].
pub struct LoadService<S>
where
    S: LoadSink,
{
    sink: S,
}

impl<S> Clone for LoadService<S>
where
    S: LoadSink + Clone,
{
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<S> LoadService<S>
where
    S: LoadSink,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Reads the files named by `sources` and loads them.
    pub async fn load_sources(
        &self,
        sources: &SourcesConfig,
        options: LoadOptions,
    ) -> Result<LoadSummary, AppError> {
        let input = read_sources(sources)?;
        self.load(&input, options).await
    }

    /// Validates `input` and writes it to the sink.
    ///
    /// # Errors
    ///
    /// - [`AppError::ValidationError`] if the input is rejected; nothing is written.
    /// - [`AppError::AlreadyLoaded`] if aggregate facts exist for the year and
    ///   `replace` is not set; nothing is written.
    pub async fn load(
        &self,
        input: &LoadInput,
        options: LoadOptions,
    ) -> Result<LoadSummary, AppError> {
        input.validate()?;

        let mut summary = LoadSummary {
            year: options.year,
            dry_run: options.dry_run,
            regions_read: input.regions.len(),
            drugs_read: input.drugs.len(),
            classes_read: input.classes.len(),
            ..Default::default()
        };

        if options.dry_run {
            info!(year = options.year, "Dry run: input is valid, nothing written");
            return Ok(summary);
        }

        let existing = self.sink.count_aggregate_facts(options.year).await?;
        if existing > 0 && !options.replace {
            return Err(AppError::AlreadyLoaded(options.year));
        }

        let regions: Vec<NewRegion> = input
            .regions
            .iter()
            .map(|row| NewRegion {
                code: row.code,
                name: row.name.clone(),
            })
            .collect();

        summary.regions_inserted = self.sink.insert_regions(&regions).await?;
        info!("Regions: {} read, {} new", summary.regions_read, summary.regions_inserted);

        summary.drugs_inserted = self.sink.insert_drugs(&input.drugs).await?;
        info!("Drugs: {} read, {} new", summary.drugs_read, summary.drugs_inserted);

        summary.classes_inserted = self.sink.insert_classes(&input.classes).await?;
        info!(
            "Therapeutic classes: {} read, {} new",
            summary.classes_read, summary.classes_inserted
        );

        let region_ids = self.sink.region_ids_by_code().await?;
        let facts = input
            .regions
            .iter()
            .map(|row| {
                let region_id = region_ids
                    .get(&row.code)
                    .copied()
                    .ok_or(AppError::RegionNotFound(row.code))?;
                Ok(NewConsumptionFact {
                    region_id: Some(region_id),
                    drug_id: None,
                    year: options.year,
                    total_units: units_of(row)?,
                    total_reimbursed: row.total_reimbursed,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if existing > 0 {
            let (replaced, inserted) = self
                .sink
                .replace_aggregate_facts(options.year, &facts)
                .await?;
            summary.facts_replaced = replaced;
            summary.facts_inserted = inserted;
            info!("Replaced {} existing facts for {}", replaced, options.year);
        } else {
            summary.facts_inserted = self.sink.insert_facts(&facts).await?;
        }
        info!("Consumption facts: {} inserted", summary.facts_inserted);

        summary.counts = Some(self.sink.table_counts().await?);
        Ok(summary)
    }
}
