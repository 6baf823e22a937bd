//! MediMap DB - PostgreSQL storage layer
//!
//! This crate implements the storage traits of `medimap-core` on top of
//! `sqlx` and PostgreSQL.
//!
//! # Overview
//!
//! The main components are:
//! - [`ConsumptionRepository`] - read access for statistics and catalog lookups
//! - [`LoadRepository`] - batch inserts used by `medimap load`
//! - [`schema`] - idempotent table DDL

mod load_repository;
mod repository;
pub mod schema;

pub use load_repository::LoadRepository;
pub use repository::ConsumptionRepository;
pub use schema::ensure_schema;
