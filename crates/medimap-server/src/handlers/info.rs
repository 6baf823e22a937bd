//! Service description endpoint.

use axum::Json;

use crate::dto::ServiceInfoResponse;

/// Service description.
///
/// Returns the service name, version and the available endpoint groups.
#[utoipa::path(
    get,
    path = "/api/v1",
    responses(
        (status = 200, description = "Service description", body = ServiceInfoResponse),
    ),
    tag = "system"
)]
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        name: "MediMap API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documentation: "/swagger-ui".to_string(),
        endpoints: vec![
            "/api/v1/health".to_string(),
            "/api/v1/stats".to_string(),
            "/api/v1/drugs".to_string(),
            "/api/v1/regions".to_string(),
        ],
    })
}
