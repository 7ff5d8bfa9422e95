pub mod http;

use std::future::Future;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::protocol::ERR_NO_LEADER;
use shared::types::{NodeInfo, ServiceDumpEntry};

pub use http::HttpCatalog;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("{}", ERR_NO_LEADER)]
    NoLeader,
    #[error("catalog returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode catalog reply: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn is_no_leader(&self) -> bool {
        match self {
            RpcError::NoLeader => true,
            RpcError::Status { message, .. } => message.contains(ERR_NO_LEADER),
            _ => false,
        }
    }
}

/// Options shared by every catalog read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOptions {
    pub datacenter: String,
    /// Let a follower answer, possibly with lagging data
    pub allow_stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub partition: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// A catalog reply together with its query metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Indexed<T> {
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub known_leader: bool,
    #[serde(default)]
    pub last_contact_ms: u64,
    pub result: T,
}

/// Read access to the catalog's raw dumps
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn node_dump(&self, opts: &QueryOptions) -> Result<Indexed<Vec<NodeInfo>>, RpcError>;

    async fn node_info(
        &self,
        opts: &QueryOptions,
        node: &str,
    ) -> Result<Indexed<Vec<NodeInfo>>, RpcError>;

    async fn service_dump(
        &self,
        opts: &QueryOptions,
    ) -> Result<Indexed<Vec<ServiceDumpEntry>>, RpcError>;

    async fn gateway_service_dump(
        &self,
        opts: &QueryOptions,
        gateway: &str,
    ) -> Result<Indexed<Vec<ServiceDumpEntry>>, RpcError>;
}

/// Run `call` once, and a second time with stale reads allowed if the first
/// attempt failed because the cluster has no leader. Never more than two
/// attempts.
pub async fn with_stale_retry<T, F, Fut>(opts: QueryOptions, call: F) -> Result<T, RpcError>
where
    F: Fn(QueryOptions) -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    let allow_stale = opts.allow_stale;
    let first = call(opts.clone()).await;

    match first {
        Err(err) if err.is_no_leader() && !allow_stale => {
            tracing::warn!("Catalog has no leader, retrying with stale reads allowed");
            let stale = QueryOptions {
                allow_stale: true,
                ..opts
            };
            call(stale).await
        }
        other => other,
    }
}
