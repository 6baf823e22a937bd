//! Read-side repository for consumption facts and reference data.

use medimap_core::error::AppError;
use medimap_core::models::{ConsumptionFact, Drug, Region};
use medimap_core::traits::{ConsumptionStore, DrugFilter, FactFilter, FactScope};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};

/// Column list for fact SELECT queries. Must remain a const literal to ensure SQL safety
/// since it is pushed into a query builder unbound.
const FACT_COLUMNS: &str = "id, region_id, drug_id, year, total_units, total_reimbursed";

/// Repository for reading consumption data from PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use medimap_db::ConsumptionRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/medimap")
///     .await?;
///
/// let repo = ConsumptionRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsumptionRepository {
    pool: Pool<Postgres>,
}

impl ConsumptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the facts matching `filter`, ordered by id.
    pub async fn facts(&self, filter: &FactFilter) -> Result<Vec<ConsumptionFact>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM consumption_facts WHERE TRUE",
            FACT_COLUMNS
        ));

        if let Some(year) = filter.year {
            qb.push(" AND year = ").push_bind(year);
        }
        if let Some(region_id) = filter.region_id {
            qb.push(" AND region_id = ").push_bind(region_id);
        }
        match filter.scope {
            FactScope::Any => {}
            FactScope::RegionAggregate => {
                qb.push(" AND drug_id IS NULL");
            }
            FactScope::AnyDrug => {
                qb.push(" AND drug_id IS NOT NULL");
            }
            FactScope::Drug(drug_id) => {
                qb.push(" AND drug_id = ").push_bind(drug_id);
            }
        }
        qb.push(" ORDER BY id");

        qb.build_query_as::<ConsumptionFact>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Returns all regions ordered by code.
    pub async fn regions(&self) -> Result<Vec<Region>, AppError> {
        sqlx::query_as::<_, Region>("SELECT id, code, name FROM regions ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn region_by_code(&self, code: i32) -> Result<Option<Region>, AppError> {
        sqlx::query_as::<_, Region>("SELECT id, code, name FROM regions WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn region_by_id(&self, id: i32) -> Result<Option<Region>, AppError> {
        sqlx::query_as::<_, Region>("SELECT id, code, name FROM regions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Returns drugs matching `filter`, ordered by id.
    ///
    /// The name filter is a case-insensitive substring match; `%` and `_` in
    /// the term match literally.
    pub async fn drugs(
        &self,
        filter: &DrugFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Drug>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, cip_code, name FROM drugs");

        if let Some(term) = filter.name_contains.as_deref() {
            qb.push(" WHERE name ILIKE ")
                .push_bind(format!("%{}%", escape_like(term)));
        }
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(sql_bound(limit, "limit")?)
            .push(" OFFSET ")
            .push_bind(sql_bound(offset, "skip")?);

        qb.build_query_as::<Drug>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn drug_by_id(&self, id: i32) -> Result<Option<Drug>, AppError> {
        sqlx::query_as::<_, Drug>("SELECT id, cip_code, name FROM drugs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn count_drugs(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drugs")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(count)
    }

    /// Checks database connectivity by executing a simple query.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }
}

/// Escapes LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Trait Implementation: ConsumptionStore
// =============================================================================

impl ConsumptionStore for ConsumptionRepository {
    async fn query_facts(&self, filter: &FactFilter) -> Result<Vec<ConsumptionFact>, AppError> {
        ConsumptionRepository::facts(self, filter).await
    }

    async fn query_regions(&self) -> Result<Vec<Region>, AppError> {
        ConsumptionRepository::regions(self).await
    }

    async fn query_region_by_code(&self, code: i32) -> Result<Option<Region>, AppError> {
        ConsumptionRepository::region_by_code(self, code).await
    }

    async fn query_region_by_id(&self, id: i32) -> Result<Option<Region>, AppError> {
        ConsumptionRepository::region_by_id(self, id).await
    }

    async fn query_drugs(
        &self,
        filter: &DrugFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Drug>, AppError> {
        ConsumptionRepository::drugs(self, filter, limit, offset).await
    }

    async fn query_drug_by_id(&self, id: i32) -> Result<Option<Drug>, AppError> {
        ConsumptionRepository::drug_by_id(self, id).await
    }

    async fn count_drugs(&self) -> Result<i64, AppError> {
        ConsumptionRepository::count_drugs(self).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        ConsumptionRepository::health_check(self).await
    }
}

/// Converts a page bound to the BIGINT Postgres expects, rejecting values past `i64::MAX`.
fn sql_bound(value: usize, name: &str) -> Result<i64, AppError> {
    i64::try_from(value)
        .map_err(|_| AppError::ValidationError(format!("{} must be at most {}", name, i64::MAX)))
}
