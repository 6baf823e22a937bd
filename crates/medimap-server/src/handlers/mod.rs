//! HTTP request handlers for API endpoints.

pub mod drugs;
pub mod health;
pub mod info;
pub mod regions;
pub mod stats;
