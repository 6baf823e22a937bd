//! Router configuration and route composition.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::{Router, routing::get};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::handlers::{drugs, health, info, regions, stats};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// Rate limiting keys on the peer address, so a router built with
/// `rate_limit_rps > 0` must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/", get(info::service_info))
        .route("/health", get(health::health_check))
        .route("/stats/overview", get(stats::overview))
        .route("/stats/regions", get(stats::region_totals))
        .route("/stats/regions/:code", get(stats::region_detail))
        .route("/stats/regions/:code/comparison", get(stats::comparison))
        .route("/stats/shares", get(stats::region_shares))
        .route("/stats/drugs", get(stats::drug_totals))
        .route("/drugs", get(drugs::list_drugs))
        .route("/drugs/search", get(drugs::search))
        .route("/drugs/:id", get(drugs::get_drug))
        .route("/regions", get(regions::list_regions))
        .route("/regions/:id", get(regions::get_region))
        .route("/regions/code/:code", get(regions::get_region_by_code));

    let cors_layer = build_cors_layer(&config.cors_origins);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware layers (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    with_rate_limit(router, config).with_state(state)
}

/// Adds the per-IP rate limiter unless `rate_limit_rps` is zero.
fn with_rate_limit(router: Router<AppState>, config: &ServerConfig) -> Router<AppState> {
    if config.rate_limit_rps == 0 {
        return router;
    }

    let governor_config = GovernorConfigBuilder::default()
        .per_second(config.rate_limit_rps.into())
        .burst_size(config.rate_limit_burst.max(1))
        .finish();

    match governor_config {
        // Arc required for cloning in layers
        Some(cfg) => router.layer(GovernorLayer {
            config: Arc::new(cfg),
        }),
        None => {
            tracing::warn!(
                rps = config.rate_limit_rps,
                burst = config.rate_limit_burst,
                "Invalid rate limit configuration, rate limiting disabled"
            );
            router
        }
    }
}

/// Build CORS layer from configuration.
///
/// If `origins` is "*", allows any origin (for development).
/// Otherwise, parses comma-separated origins.
fn build_cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600));

    if origins == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(allowed)
    }
}
