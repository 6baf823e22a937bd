use medimap_core::{CatalogService, StatsService};
use medimap_db::ConsumptionRepository;

/// Shared application state for all handlers.
///
/// This is wrapped in Arc internally by Axum when using `with_state()`,
/// so all fields must implement Clone (which they do via internal `Arc<Pool>`).
/// The API holds read access only; nothing here can write to the store.
#[derive(Clone)]
pub struct AppState {
    /// Aggregation engine
    pub stats_service: StatsService<ConsumptionRepository>,

    /// Region and drug reference lookups
    pub catalog_service: CatalogService<ConsumptionRepository>,

    /// Year used when a request omits `year`
    pub default_year: i32,
}

impl AppState {
    /// Creates a new application state with all services initialized.
    pub fn new(pool: sqlx::PgPool, default_year: i32) -> Self {
        let repo = ConsumptionRepository::new(pool);

        Self {
            stats_service: StatsService::new(repo.clone()),
            catalog_service: CatalogService::new(repo),
            default_year,
        }
    }

    /// Resolves and validates the year of a request.
    pub fn year(&self, requested: Option<i32>) -> Result<i32, medimap_core::AppError> {
        medimap_core::validate_year(requested.unwrap_or(self.default_year))
    }
}
