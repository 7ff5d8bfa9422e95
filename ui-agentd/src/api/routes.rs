use std::sync::Arc;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::protocol::{HEADER_INDEX, HEADER_KNOWN_LEADER, HEADER_LAST_CONTACT, METRICS_PROXY_PATH};
use crate::api::error::ApiError;
use crate::catalog::{with_stale_retry, Catalog, Indexed, QueryOptions};
use crate::config::{AgentConfig, DnsConfig};
use crate::metrics_proxy::MetricsProxy;
use crate::summary::summarize_services;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub agent: Arc<AgentConfig>,
    pub dns: Arc<DnsConfig>,
    pub metrics_proxy: MetricsProxy,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiQuery {
    pub dc: Option<String>,
    pub filter: Option<String>,
    pub partition: Option<String>,
    pub ns: Option<String>,
    /// Present (with any value) to allow stale reads
    pub stale: Option<String>,
}

impl AppState {
    fn query_options(&self, query: UiQuery) -> QueryOptions {
        QueryOptions {
            datacenter: query
                .dc
                .filter(|dc| !dc.is_empty())
                .unwrap_or_else(|| self.agent.datacenter.clone()),
            allow_stale: query.stale.is_some(),
            filter: query.filter.filter(|f| !f.is_empty()),
            partition: query.partition.unwrap_or_default(),
            namespace: query.ns.unwrap_or_default(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/internal/ui/nodes", get(get_nodes))
        .route("/v1/internal/ui/node/", get(missing_node_name))
        .route("/v1/internal/ui/node/:node", get(get_node))
        .route("/v1/internal/ui/services", get(get_services))
        .route("/v1/internal/ui/gateway-services-nodes/", get(missing_gateway_name))
        .route("/v1/internal/ui/gateway-services-nodes/:gateway", get(get_gateway_services))
        .route(METRICS_PROXY_PATH, any(metrics_proxy))
        // `/*path` needs a non-empty tail
        .route(&format!("{}/", METRICS_PROXY_PATH), any(metrics_proxy))
        .route(&format!("{}/*path", METRICS_PROXY_PATH), any(metrics_proxy))
        .with_state(state)
}

/// JSON reply with the catalog's query metadata in headers
fn with_meta<T: Serialize>(meta: (u64, bool, u64), body: T) -> Response {
    let (index, known_leader, last_contact_ms) = meta;
    (
        [
            (HEADER_INDEX, index.to_string()),
            (HEADER_KNOWN_LEADER, known_leader.to_string()),
            (HEADER_LAST_CONTACT, last_contact_ms.to_string()),
        ],
        Json(body),
    )
        .into_response()
}

fn meta_of<T>(reply: &Indexed<T>) -> (u64, bool, u64) {
    (reply.index, reply.known_leader, reply.last_contact_ms)
}

async fn get_nodes(
    State(state): State<AppState>,
    Query(query): Query<UiQuery>,
) -> Result<Response, ApiError> {
    let opts = state.query_options(query);
    let catalog = &state.catalog;

    let reply = with_stale_retry(opts, |o| async move { catalog.node_dump(&o).await }).await?;

    Ok(with_meta(meta_of(&reply), reply.result))
}

async fn get_node(
    State(state): State<AppState>,
    Path(node): Path<String>,
    Query(query): Query<UiQuery>,
) -> Result<Response, ApiError> {
    if node.is_empty() {
        return missing_node_name().await;
    }
    let opts = state.query_options(query);
    let catalog = &state.catalog;
    let node = node.as_str();

    let reply = with_stale_retry(opts, |o| async move { catalog.node_info(&o, node).await }).await?;

    let meta = meta_of(&reply);
    match reply.result.into_iter().next() {
        Some(info) => Ok(with_meta(meta, info)),
        None => Err(ApiError::NotFound(format!("Node {} not found", node))),
    }
}

async fn get_services(
    State(state): State<AppState>,
    Query(query): Query<UiQuery>,
) -> Result<Response, ApiError> {
    let opts = state.query_options(query);
    let datacenter = opts.datacenter.clone();
    let catalog = &state.catalog;

    let reply = with_stale_retry(opts, |o| async move { catalog.service_dump(&o).await }).await?;

    let summaries = summarize_services(&reply.result, &state.dns, &datacenter);
    Ok(with_meta(meta_of(&reply), summaries))
}

async fn get_gateway_services(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    Query(query): Query<UiQuery>,
) -> Result<Response, ApiError> {
    if gateway.is_empty() {
        return missing_gateway_name().await;
    }
    let opts = state.query_options(query);
    let datacenter = opts.datacenter.clone();
    let catalog = &state.catalog;
    let gateway = gateway.as_str();

    let reply = with_stale_retry(opts, |o| async move {
        catalog.gateway_service_dump(&o, gateway).await
    })
    .await?;

    let summaries = summarize_services(&reply.result, &state.dns, &datacenter);
    Ok(with_meta(meta_of(&reply), summaries))
}

async fn missing_node_name() -> Result<Response, ApiError> {
    Err(ApiError::BadRequest("Missing node name".to_string()))
}

async fn missing_gateway_name() -> Result<Response, ApiError> {
    Err(ApiError::BadRequest("Missing gateway name".to_string()))
}

async fn metrics_proxy(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, ApiError> {
    state.metrics_proxy.handle(req).await
}
