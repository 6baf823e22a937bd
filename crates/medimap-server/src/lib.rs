//! MediMap Server - REST API for territorial drug consumption statistics
//!
//! This crate provides a read-only HTTP API over the MediMap store:
//!
//! - **Stats**: national overview, region totals, comparison to the national mean, shares
//! - **Drugs**: catalog listing, lookup and name search
//! - **Regions**: region reference data
//!
//! # API Documentation
//!
//! When running the server, interactive API documentation is available
//! at `/swagger-ui`.

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;
