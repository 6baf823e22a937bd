//! Table definitions.
//!
//! Plain idempotent DDL, applied by `medimap load --create-schema` and by the
//! integration tests. There is no versioned migration runner.

use medimap_core::error::AppError;
use sqlx::PgPool;

/// DDL statements, in dependency order.
/// Each statement must be executed separately due to sqlx limitations.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS regions (
        id SERIAL PRIMARY KEY,
        code INTEGER NOT NULL UNIQUE,
        name VARCHAR(100) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS drugs (
        id SERIAL PRIMARY KEY,
        cip_code VARCHAR(20) NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS therapeutic_classes (
        id SERIAL PRIMARY KEY,
        atc_code VARCHAR(10) NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS consumption_facts (
        id SERIAL PRIMARY KEY,
        region_id INTEGER REFERENCES regions(id),
        drug_id INTEGER REFERENCES drugs(id),
        year INTEGER NOT NULL,
        total_units BIGINT NOT NULL CHECK (total_units >= 0),
        total_reimbursed NUMERIC(15, 2) NOT NULL CHECK (total_reimbursed >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_consumption_facts_year_region ON consumption_facts(year, region_id)",
    "CREATE INDEX IF NOT EXISTS idx_consumption_facts_year_drug ON consumption_facts(year, drug_id)",
];

/// Creates the tables and indexes that do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(AppError::DatabaseError)?;
    }
    tracing::debug!("Schema is up to date");
    Ok(())
}
