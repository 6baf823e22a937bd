//! Test utilities for integration tests.
//!
//! Provides helper functions to set up isolated PostgreSQL containers
//! with the MediMap schema for each test.

use medimap_core::models::{NewConsumptionFact, NewDrug, NewRegion};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// Sets up a PostgreSQL container and returns a connection pool.
///
/// Each call creates a fresh, isolated database container. The container is
/// automatically cleaned up when the returned `ContainerAsync` is dropped.
///
/// # Returns
///
/// A tuple of (PgPool, ContainerAsync) - keep the container alive for the test duration.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "postgres")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    // Create connection pool with retry logic for container startup
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!(
                        "Failed to connect to database after {} retries: {}",
                        MAX_RETRIES, e
                    );
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    medimap_db::ensure_schema(&pool)
        .await
        .expect("Failed to create schema");

    (pool, container)
}

pub fn new_region(code: i32, name: &str) -> NewRegion {
    NewRegion {
        code,
        name: name.to_string(),
    }
}

pub fn new_drug(cip_code: &str, name: &str) -> NewDrug {
    NewDrug {
        cip_code: cip_code.to_string(),
        name: name.to_string(),
    }
}

/// Region-level aggregate fact; `cents` is the reimbursed amount in cents.
pub fn aggregate_fact(region_id: i32, year: i32, units: i64, cents: i64) -> NewConsumptionFact {
    NewConsumptionFact {
        region_id: Some(region_id),
        drug_id: None,
        year,
        total_units: units,
        total_reimbursed: Decimal::new(cents, 2),
    }
}
