//! MediMap Core - Domain types, aggregation engine, and services.
//!
//! This crate provides the core functionality for MediMap, including:
//!
//! - **Domain models**: [`Region`], [`Drug`], [`ConsumptionFact`] and the derived
//!   statistics ([`RegionStat`], [`Overview`], [`Comparison`], ...)
//! - **Aggregation engine**: [`StatsService`] groups, sums and ranks consumption facts
//! - **Services**: [`CatalogService`] for reference data, [`LoadService`] for batch loads
//! - **Traits**: [`ConsumptionStore`] and [`LoadSink`] for dependency injection
//!
//! # Architecture
//!
//! This crate is reused by the REST API (`medimap-server`) and the CLI
//! (`medimap-cli`). Business logic is decoupled from PostgreSQL through traits:
//!
//! - [`ConsumptionStore`] - read access to facts and reference data
//! - [`LoadSink`] - write access used by the batch loader only
//!
//! `medimap-db` provides the PostgreSQL implementations.
//!
//! # Example
//!
//! ```ignore
//! use medimap_core::StatsService;
//!
//! let stats = StatsService::new(store);
//! let cmp = stats.compare_to_national(93, 2023).await?;
//! println!("{} is {} against the national mean", cmp.name, cmp.percent_difference);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod load;
pub mod models;
pub mod stats;
pub mod traits;
pub mod validate;

// Configuration
pub use config::{DEFAULT_YEAR, DbConfig, SourcesConfig, default_config_path, load_sources_config};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{
    Comparison, ConsumptionFact, Drug, DrugStat, NewConsumptionFact, NewDrug, NewRegion,
    NewTherapeuticClass, Overview, Ratio, Region, RegionDetail, RegionShare, RegionStat,
    TableCounts, TherapeuticClass, round_currency,
};

// Traits for dependency injection
pub use traits::{ConsumptionStore, DrugFilter, FactFilter, FactScope, LoadSink};

// Services (generic over trait implementations)
pub use catalog::CatalogService;
pub use load::{LoadInput, LoadOptions, LoadService, LoadSummary};
pub use stats::StatsService;

// Input validation
pub use validate::{validate_search_term, validate_year};
