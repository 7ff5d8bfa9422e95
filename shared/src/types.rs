use std::collections::HashMap;
use serde::{Deserialize, Deserializer, Serialize};
use crate::ordered_set::OrderedSet;

/// Identifies one logical service across every node that runs an instance
/// of it. Ordering is by name, then partition, then namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId {
    pub name: String,
    /// Empty means the default partition
    pub partition: String,
    /// Empty means the default namespace
    pub namespace: String,
}

impl ServiceId {
    pub fn new(name: impl Into<String>, partition: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
            namespace: namespace.into(),
        }
    }
}

/// The catalog sends `null` for empty collections; read it as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Service kinds understood by the dashboard. Anything unrecognised is
/// treated as a typical service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ServiceKind {
    #[default]
    Typical,
    ConnectProxy,
    MeshGateway,
    TerminatingGateway,
    IngressGateway,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Typical => "",
            ServiceKind::ConnectProxy => "connect-proxy",
            ServiceKind::MeshGateway => "mesh-gateway",
            ServiceKind::TerminatingGateway => "terminating-gateway",
            ServiceKind::IngressGateway => "ingress-gateway",
        }
    }

    pub fn is_typical(&self) -> bool {
        matches!(self, ServiceKind::Typical)
    }
}

impl From<String> for ServiceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "connect-proxy" => ServiceKind::ConnectProxy,
            "mesh-gateway" => ServiceKind::MeshGateway,
            "terminating-gateway" => ServiceKind::TerminatingGateway,
            "ingress-gateway" => ServiceKind::IngressGateway,
            _ => ServiceKind::Typical,
        }
    }
}

impl From<ServiceKind> for &'static str {
    fn from(kind: ServiceKind) -> Self {
        kind.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Node {
    pub node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProxyConfig {
    pub destination_service_name: String,
}

/// One registered service instance on a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeService {
    pub kind: ServiceKind,
    #[serde(rename = "ID")]
    pub id: String,
    /// Service name
    #[serde(rename = "Service")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: HashMap<String, String>,
    pub proxy: ProxyConfig,
    pub partition: String,
    pub namespace: String,
}

impl NodeService {
    pub fn service_id(&self) -> ServiceId {
        ServiceId::new(&self.name, &self.partition, &self.namespace)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthCheck {
    pub node: String,
    #[serde(rename = "CheckID")]
    pub check_id: String,
    pub name: String,
    /// "passing", "warning", "critical", or anything else the catalog emits
    pub status: String,
    pub output: String,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    pub service_name: String,
}

/// A service name qualified by partition and namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceName {
    pub name: String,
    pub partition: String,
    pub namespace: String,
}

impl ServiceName {
    pub fn to_service_id(&self) -> ServiceId {
        ServiceId::new(&self.name, &self.partition, &self.namespace)
    }
}

/// Links a gateway to one of the services it fronts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GatewayService {
    pub gateway: ServiceName,
    pub service: ServiceName,
    pub port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub hosts: Vec<String>,
}

impl GatewayService {
    /// Addresses the fronted service is reachable at through the gateway.
    ///
    /// Explicitly configured hosts win; otherwise `dns_names` are used.
    /// A gateway listener without a port yields nothing.
    pub fn addresses(&self, dns_names: &[String]) -> Vec<String> {
        if self.port == 0 {
            return Vec::new();
        }
        let hosts = if self.hosts.is_empty() { dns_names } else { &self.hosts };
        hosts
            .iter()
            .map(|host| format!("{}:{}", host, self.port))
            .collect()
    }
}

/// A raw record of the service dump: one instance (or one gateway
/// association) together with the node it lives on and its checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceDumpEntry {
    pub node: Node,
    pub service: Option<NodeService>,
    #[serde(deserialize_with = "null_as_default")]
    pub checks: Vec<HealthCheck>,
    pub gateway_service: Option<GatewayService>,
}

/// Everything the catalog knows about a single node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub node: String,
    pub address: String,
    pub datacenter: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tagged_addresses: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub services: Vec<NodeService>,
    #[serde(deserialize_with = "null_as_default")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GatewayConfig {
    pub addresses: OrderedSet<String>,
}

/// Aggregated dashboard view of one logical service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceSummary {
    #[serde(skip_serializing_if = "ServiceKind::is_typical")]
    pub kind: ServiceKind,
    pub name: String,
    pub tags: Vec<String>,
    /// One entry per instance; a node running two instances appears twice
    pub nodes: Vec<String>,
    pub instance_count: usize,
    pub proxy_for: OrderedSet<String>,
    pub checks_passing: usize,
    pub checks_warning: usize,
    pub checks_critical: usize,
    pub external_sources: OrderedSet<String>,
    pub gateway_config: GatewayConfig,
    pub partition: String,
    pub namespace: String,
}

impl ServiceSummary {
    pub fn new(id: &ServiceId) -> Self {
        Self {
            name: id.name.clone(),
            partition: id.partition.clone(),
            namespace: id.namespace.clone(),
            ..Default::default()
        }
    }

    pub fn service_id(&self) -> ServiceId {
        ServiceId::new(&self.name, &self.partition, &self.namespace)
    }
}
