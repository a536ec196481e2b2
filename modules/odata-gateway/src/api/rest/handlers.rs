use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use tablegate_errors::Problem;
use tablegate_odata::{ODataQuery, next_link};

use crate::api::metadata::metadata_document;
use crate::domain::service::GatewayService;

use super::dto::{ODataEnvelope, ServiceDocument};
use super::error::domain_error_to_problem;

const ODATA_VERSION: [(&str, &str); 1] = [("OData-Version", "4.0")];

pub(super) async fn service_document(State(svc): State<Arc<GatewayService>>) -> Response {
    let doc = ServiceDocument::new(svc.config().base_url(), &svc.config().entity_sets);
    (ODATA_VERSION, Json(doc)).into_response()
}

pub(super) async fn metadata(
    State(svc): State<Arc<GatewayService>>,
) -> Result<Response, Problem> {
    let mut sets = Vec::with_capacity(svc.config().entity_sets.len());
    for name in &svc.config().entity_sets {
        let columns = svc
            .describe(name)
            .await
            .map_err(|e| domain_error_to_problem(&e, "/odata/$metadata"))?;
        sets.push((name.clone(), columns));
    }
    let xml = metadata_document(&svc.config().namespace, &svc.config().container, &sets);
    Ok((
        [
            ("Content-Type", "application/xml"),
            ("OData-Version", "4.0"),
        ],
        xml,
    )
        .into_response())
}

pub(super) async fn entity_set(
    State(svc): State<Arc<GatewayService>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, Problem> {
    let instance = format!("/odata/{table}");
    let query = parse_options(&pairs, &svc, &instance)?;

    let result = svc
        .query_entity_set(&table, &query)
        .await
        .map_err(|e| domain_error_to_problem(&e, &instance))?;

    let base_url = svc.config().base_url();
    let set_url = format!("{base_url}/odata/{}", result.entity_set);
    let envelope = ODataEnvelope {
        context: format!("{base_url}/odata/$metadata#{}", result.entity_set),
        next_link: next_link(&set_url, &query, &result.info),
        count: result.page.total_count,
        value: result.page.rows,
    };
    Ok((ODATA_VERSION, Json(envelope)).into_response())
}

/// Bare `$count` endpoint: plain-text total for the filtered set.
pub(super) async fn entity_count(
    State(svc): State<Arc<GatewayService>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, Problem> {
    let instance = format!("/odata/{table}/$count");
    let query = parse_options(&pairs, &svc, &instance)?;

    let total = svc
        .count_entity_set(&table, &query)
        .await
        .map_err(|e| domain_error_to_problem(&e, &instance))?;

    Ok((
        [
            ("Content-Type", "text/plain"),
            ("OData-Version", "4.0"),
        ],
        total.to_string(),
    )
        .into_response())
}

pub(super) async fn health(State(svc): State<Arc<GatewayService>>) -> Response {
    let entity_sets = svc.health().await;
    let healthy = entity_sets.iter().all(|s| s.reachable);
    let status = if healthy {
        http::StatusCode::OK
    } else {
        http::StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "entity_sets": entity_sets,
    });
    (status, Json(body)).into_response()
}

fn parse_options(
    pairs: &[(String, String)],
    svc: &GatewayService,
    instance: &str,
) -> Result<ODataQuery, Problem> {
    ODataQuery::from_pairs(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        svc.limits(),
    )
    .map_err(|e| domain_error_to_problem(&e.into(), instance))
}
