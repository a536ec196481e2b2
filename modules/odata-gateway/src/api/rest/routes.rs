use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::domain::service::GatewayService;

use super::handlers;

/// Build the OData REST surface. Static segments (`$metadata`, `$count`) take
/// precedence over the `{table}` capture.
pub fn router(service: Arc<GatewayService>) -> Router {
    Router::new()
        .route("/odata", get(handlers::service_document))
        .route("/odata/$metadata", get(handlers::metadata))
        .route("/odata/{table}", get(handlers::entity_set))
        .route("/odata/{table}/$count", get(handlers::entity_count))
        .route("/health", get(handlers::health))
        .with_state(service)
}
