//! Domain models.
//!
//! Reference entities ([`Region`], [`Drug`], [`TherapeuticClass`]) and raw
//! [`ConsumptionFact`] rows map one-to-one onto the relational tables. The
//! remaining types are derived statistics produced by
//! [`StatsService`](crate::stats::StatsService); they are never persisted.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

/// French administrative region. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Region {
    pub id: i32,
    /// Stable external identifier (INSEE region code, e.g. 11 for Île-de-France).
    pub code: i32,
    pub name: String,
}

/// Packaged drug product, keyed by its CIP code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Drug {
    pub id: i32,
    pub cip_code: String,
    pub name: String,
}

/// ATC therapeutic class.
///
/// Loaded with the reference data but not joined into consumption facts yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TherapeuticClass {
    pub id: i32,
    pub atc_code: String,
    pub name: String,
}

/// One consumption row.
///
/// A null `drug_id` marks a region-level aggregate across all drugs for the
/// year. That is the only form the loader produces today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ConsumptionFact {
    pub id: i32,
    pub region_id: Option<i32>,
    pub drug_id: Option<i32>,
    pub year: i32,
    /// Number of dispensed packages.
    pub total_units: i64,
    /// Amount reimbursed by the health insurance, in euros.
    pub total_reimbursed: Decimal,
}

impl ConsumptionFact {
    /// Returns true if this row aggregates every drug of its region.
    pub fn is_region_aggregate(&self) -> bool {
        self.drug_id.is_none()
    }
}

// =============================================================================
// Insert payloads (batch loader)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegion {
    pub code: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrug {
    pub cip_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTherapeuticClass {
    pub atc_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConsumptionFact {
    pub region_id: Option<i32>,
    pub drug_id: Option<i32>,
    pub year: i32,
    pub total_units: i64,
    pub total_reimbursed: Decimal,
}

/// Row counts of the four tables, reported after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub regions: i64,
    pub drugs: i64,
    pub therapeutic_classes: i64,
    pub consumption_facts: i64,
}

// =============================================================================
// Derived statistics
// =============================================================================

/// Summed consumption of one region for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionStat {
    pub code: i32,
    pub name: String,
    pub total_units: i64,
    pub total_reimbursed: Decimal,
}

/// [`RegionStat`] for a single requested region, echoing the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionDetail {
    pub code: i32,
    pub name: String,
    pub year: i32,
    pub total_units: i64,
    pub total_reimbursed: Decimal,
}

/// National totals for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub year: i32,
    pub total_units: i64,
    pub total_reimbursed: Decimal,
    /// Regions with at least one fact in `year`.
    pub region_count: i64,
    /// Size of the drug catalog, independent of `year`.
    pub drug_count: i64,
}

/// A region's reimbursement against the national mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub code: i32,
    pub name: String,
    pub year: i32,
    pub region_value: Decimal,
    pub national_mean: Decimal,
    pub difference: Decimal,
    pub percent_difference: Ratio,
    /// 1-based position by reimbursement; `None` when the region has no facts
    /// for the year and therefore is not ranked.
    pub rank: Option<usize>,
    /// Number of ranked regions.
    pub region_count: usize,
}

/// A region's share of the national reimbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionShare {
    #[serde(flatten)]
    pub stat: RegionStat,
    pub share_pct: Ratio,
}

/// Summed consumption of one drug across regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugStat {
    pub cip_code: String,
    pub name: String,
    pub total_units: i64,
    pub total_reimbursed: Decimal,
}

// =============================================================================
// Ratio
// =============================================================================

/// A percentage whose denominator may be zero.
///
/// `Undefined` is a result in its own right: a zero baseline makes the ratio
/// meaningless, which is a different claim from "0% difference". It is never
/// coerced to zero or infinity. Serializes as a decimal string or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    Defined(Decimal),
    Undefined,
}

impl Ratio {
    /// Computes `numerator / denominator * 100`, rounded to two decimals.
    ///
    /// # Examples
    ///
    /// ```
    /// use medimap_core::Ratio;
    /// use rust_decimal::Decimal;
    ///
    /// let pct = Ratio::percent(Decimal::from(-1900), Decimal::from(3100));
    /// assert_eq!(pct, Ratio::Defined(Decimal::new(-6129, 2)));
    ///
    /// assert_eq!(Ratio::percent(Decimal::ONE, Decimal::ZERO), Ratio::Undefined);
    /// ```
    pub fn percent(numerator: Decimal, denominator: Decimal) -> Self {
        if denominator.is_zero() {
            return Ratio::Undefined;
        }
        // Overflow can only come from absurd magnitudes; treat it as not representable.
        numerator
            .checked_div(denominator)
            .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| Ratio::Defined(round_currency(pct)))
            .unwrap_or(Ratio::Undefined)
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Ratio::Defined(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ratio::Defined(_))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Defined(v) => write!(f, "{:+.2}%", v),
            Ratio::Undefined => write!(f, "n/a"),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Rounds to cents, half away from zero, always carrying two decimals.
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
