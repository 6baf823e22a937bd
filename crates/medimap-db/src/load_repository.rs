//! Write-side repository used by the batch loader.
//!
//! Batches are inserted with one `UNNEST` statement per table. Reference
//! inserts use `ON CONFLICT DO NOTHING` on the natural key, so reloading the
//! same extract leaves existing ids untouched. Replacing the facts of a year
//! runs the delete and the insert in a single transaction.

use std::collections::HashMap;

use medimap_core::error::AppError;
use medimap_core::models::{NewConsumptionFact, NewDrug, NewRegion, NewTherapeuticClass, TableCounts};
use medimap_core::traits::LoadSink;
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Pool, Postgres};
use tracing::debug;

/// Repository for loading reference data and consumption facts.
#[derive(Clone)]
pub struct LoadRepository {
    pool: Pool<Postgres>,
}

impl LoadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts regions that do not exist yet. Returns the number of rows added.
    pub async fn insert_regions(&self, regions: &[NewRegion]) -> Result<u64, AppError> {
        if regions.is_empty() {
            return Ok(0);
        }
        let codes: Vec<i32> = regions.iter().map(|r| r.code).collect();
        let names: Vec<String> = regions.iter().map(|r| r.name.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO regions (code, name)
            SELECT * FROM UNNEST($1::int4[], $2::text[])
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&codes)
        .bind(&names)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected())
    }

    /// Inserts drugs that do not exist yet. Returns the number of rows added.
    pub async fn insert_drugs(&self, drugs: &[NewDrug]) -> Result<u64, AppError> {
        if drugs.is_empty() {
            return Ok(0);
        }
        let cip_codes: Vec<String> = drugs.iter().map(|d| d.cip_code.clone()).collect();
        let names: Vec<String> = drugs.iter().map(|d| d.name.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO drugs (cip_code, name)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT (cip_code) DO NOTHING
            "#,
        )
        .bind(&cip_codes)
        .bind(&names)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected())
    }

    /// Inserts therapeutic classes that do not exist yet. Returns the number of rows added.
    pub async fn insert_classes(&self, classes: &[NewTherapeuticClass]) -> Result<u64, AppError> {
        if classes.is_empty() {
            return Ok(0);
        }
        let atc_codes: Vec<String> = classes.iter().map(|c| c.atc_code.clone()).collect();
        let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO therapeutic_classes (atc_code, name)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT (atc_code) DO NOTHING
            "#,
        )
        .bind(&atc_codes)
        .bind(&names)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected())
    }

    /// Returns a map of region code → id.
    pub async fn region_ids_by_code(&self) -> Result<HashMap<i32, i32>, AppError> {
        let rows: Vec<(i32, i32)> = sqlx::query_as("SELECT code, id FROM regions")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(rows.into_iter().collect())
    }

    pub async fn count_aggregate_facts(&self, year: i32) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM consumption_facts WHERE year = $1 AND drug_id IS NULL",
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(count)
    }

    /// Deletes the aggregate facts of `year` and inserts `facts` in one transaction.
    ///
    /// Returns `(deleted, inserted)`. On any error the transaction is dropped
    /// and the previous rows stay in place.
    pub async fn replace_aggregate_facts(
        &self,
        year: i32,
        facts: &[NewConsumptionFact],
    ) -> Result<(u64, u64), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let deleted =
            sqlx::query("DELETE FROM consumption_facts WHERE year = $1 AND drug_id IS NULL")
                .bind(year)
                .execute(&mut *tx)
                .await
                .map_err(AppError::DatabaseError)?
                .rows_affected();
        let inserted = insert_fact_rows(&mut *tx, facts).await?;

        tx.commit().await.map_err(AppError::DatabaseError)?;

        debug!(year, deleted, inserted, "Replaced aggregate facts");
        Ok((deleted, inserted))
    }

    /// Inserts consumption facts. Returns the number of rows added.
    pub async fn insert_facts(&self, facts: &[NewConsumptionFact]) -> Result<u64, AppError> {
        insert_fact_rows(&self.pool, facts).await
    }

    /// Returns current row counts of the four tables.
    pub async fn table_counts(&self) -> Result<TableCounts, AppError> {
        let row: CountsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM regions) AS regions,
                (SELECT COUNT(*) FROM drugs) AS drugs,
                (SELECT COUNT(*) FROM therapeutic_classes) AS therapeutic_classes,
                (SELECT COUNT(*) FROM consumption_facts) AS consumption_facts
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(TableCounts {
            regions: row.regions.unwrap_or(0),
            drugs: row.drugs.unwrap_or(0),
            therapeutic_classes: row.therapeutic_classes.unwrap_or(0),
            consumption_facts: row.consumption_facts.unwrap_or(0),
        })
    }
}

/// Batch insert of consumption facts on any executor (pool or transaction).
async fn insert_fact_rows<'e, E>(executor: E, facts: &[NewConsumptionFact]) -> Result<u64, AppError>
where
    E: PgExecutor<'e>,
{
    if facts.is_empty() {
        return Ok(0);
    }
    let region_ids: Vec<Option<i32>> = facts.iter().map(|f| f.region_id).collect();
    let drug_ids: Vec<Option<i32>> = facts.iter().map(|f| f.drug_id).collect();
    let years: Vec<i32> = facts.iter().map(|f| f.year).collect();
    let units: Vec<i64> = facts.iter().map(|f| f.total_units).collect();
    let reimbursed: Vec<Decimal> = facts.iter().map(|f| f.total_reimbursed).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO consumption_facts (region_id, drug_id, year, total_units, total_reimbursed)
        SELECT * FROM UNNEST($1::int4[], $2::int4[], $3::int4[], $4::int8[], $5::numeric[])
        "#,
    )
    .bind(&region_ids)
    .bind(&drug_ids)
    .bind(&years)
    .bind(&units)
    .bind(&reimbursed)
    .execute(executor)
    .await
    .map_err(AppError::DatabaseError)?;

    Ok(result.rows_affected())
}

/// Helper struct for deserializing the table counts query
#[derive(sqlx::FromRow)]
struct CountsRow {
    regions: Option<i64>,
    drugs: Option<i64>,
    therapeutic_classes: Option<i64>,
    consumption_facts: Option<i64>,
}

// =============================================================================
// Trait Implementation: LoadSink
// =============================================================================

impl LoadSink for LoadRepository {
    async fn insert_regions(&self, regions: &[NewRegion]) -> Result<u64, AppError> {
        LoadRepository::insert_regions(self, regions).await
    }

    async fn insert_drugs(&self, drugs: &[NewDrug]) -> Result<u64, AppError> {
        LoadRepository::insert_drugs(self, drugs).await
    }

    async fn insert_classes(&self, classes: &[NewTherapeuticClass]) -> Result<u64, AppError> {
        LoadRepository::insert_classes(self, classes).await
    }

    async fn region_ids_by_code(&self) -> Result<HashMap<i32, i32>, AppError> {
        LoadRepository::region_ids_by_code(self).await
    }

    async fn count_aggregate_facts(&self, year: i32) -> Result<i64, AppError> {
        LoadRepository::count_aggregate_facts(self, year).await
    }

    async fn replace_aggregate_facts(
        &self,
        year: i32,
        facts: &[NewConsumptionFact],
    ) -> Result<(u64, u64), AppError> {
        LoadRepository::replace_aggregate_facts(self, year, facts).await
    }

    async fn insert_facts(&self, facts: &[NewConsumptionFact]) -> Result<u64, AppError> {
        LoadRepository::insert_facts(self, facts).await
    }

    async fn table_counts(&self) -> Result<TableCounts, AppError> {
        LoadRepository::table_counts(self).await
    }
}
