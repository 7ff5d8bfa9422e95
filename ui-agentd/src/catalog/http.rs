use std::time::Duration;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::protocol::ERR_NO_LEADER;
use shared::types::{NodeInfo, ServiceDumpEntry};
use crate::catalog::{Catalog, Indexed, QueryOptions, RpcError};
use crate::config::CatalogConfig;

const METHOD_NODE_DUMP: &str = "Internal.NodeDump";
const METHOD_NODE_INFO: &str = "Internal.NodeInfo";
const METHOD_SERVICE_DUMP: &str = "Internal.ServiceDump";
const METHOD_GATEWAY_SERVICE_DUMP: &str = "Internal.GatewayServiceDump";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RpcRequest<'a> {
    #[serde(flatten)]
    opts: &'a QueryOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    node: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_name: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RpcErrorBody {
    #[serde(default)]
    error: String,
}

/// Catalog client speaking JSON over HTTP: `POST {rpc_url}/rpc/{method}`
#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    rpc_url: String,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("Failed to build catalog HTTP client")?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: &RpcRequest<'_>,
    ) -> Result<Indexed<T>, RpcError> {
        let url = format!("{}/rpc/{}", self.rpc_url, method);
        tracing::debug!("Catalog RPC {} (stale={})", method, request.opts.allow_stale);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<RpcErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(rpc_error(status.as_u16(), message));
        }

        serde_json::from_slice(&body).map_err(|e| RpcError::Decode(e.to_string()))
    }
}

fn rpc_error(status: u16, message: String) -> RpcError {
    if message.contains(ERR_NO_LEADER) {
        RpcError::NoLeader
    } else {
        RpcError::Status { status, message }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn node_dump(&self, opts: &QueryOptions) -> Result<Indexed<Vec<NodeInfo>>, RpcError> {
        let request = RpcRequest {
            opts,
            node: None,
            service_name: None,
        };
        self.call(METHOD_NODE_DUMP, &request).await
    }

    async fn node_info(
        &self,
        opts: &QueryOptions,
        node: &str,
    ) -> Result<Indexed<Vec<NodeInfo>>, RpcError> {
        let request = RpcRequest {
            opts,
            node: Some(node),
            service_name: None,
        };
        self.call(METHOD_NODE_INFO, &request).await
    }

    async fn service_dump(
        &self,
        opts: &QueryOptions,
    ) -> Result<Indexed<Vec<ServiceDumpEntry>>, RpcError> {
        let request = RpcRequest {
            opts,
            node: None,
            service_name: None,
        };
        self.call(METHOD_SERVICE_DUMP, &request).await
    }

    async fn gateway_service_dump(
        &self,
        opts: &QueryOptions,
        gateway: &str,
    ) -> Result<Indexed<Vec<ServiceDumpEntry>>, RpcError> {
        let request = RpcRequest {
            opts,
            node: None,
            service_name: Some(gateway),
        };
        self.call(METHOD_GATEWAY_SERVICE_DUMP, &request).await
    }
}
