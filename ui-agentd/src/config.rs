use std::path::Path;
use std::sync::Arc;
use arc_swap::ArcSwap;
use serde::Deserialize;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub datacenter: String,
}

/// Domains used to build ingress DNS names. Either may be empty.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_dns_domain")]
    pub domain: String,
    #[serde(default)]
    pub alt_domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Read once at startup; not reloadable
    #[serde(default = "default_ui_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub metrics_proxy: MetricsProxyConfig,
}

/// Reloadable metrics proxy settings. An empty `base_url` disables the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricsProxyConfig {
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Shared handle to the current metrics proxy snapshot. Reloads swap the
/// whole value; readers take one snapshot per request.
pub type MetricsProxyHandle = Arc<ArcSwap<MetricsProxyConfig>>;

fn default_dns_domain() -> String {
    "consul.".to_string()
}

fn default_ui_enabled() -> bool {
    true
}

fn default_listen() -> String {
    "[::]:8500".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8300".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            domain: default_dns_domain(),
            alt_domain: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            enabled: default_ui_enabled(),
            metrics_proxy: MetricsProxyConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn metrics_proxy_handle(&self) -> MetricsProxyHandle {
        Arc::new(ArcSwap::from_pointee(self.ui.metrics_proxy.clone()))
    }
}

/// Re-read the config file and publish its metrics proxy section.
///
/// On any error the previous snapshot stays in place.
pub fn reload_metrics_proxy(path: &Path, handle: &MetricsProxyHandle) -> Result<()> {
    let config = Config::load(path)?;
    let next = config.ui.metrics_proxy;
    let previous = handle.swap(Arc::new(next.clone()));

    if *previous != next {
        tracing::info!(
            "Metrics proxy base URL changed from {:?} to {:?}",
            previous.base_url,
            next.base_url
        );
    }
    Ok(())
}
