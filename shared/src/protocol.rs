/// Mount path of the metrics proxy. Everything below it is relayed.
pub const METRICS_PROXY_PATH: &str = "/v1/internal/ui/metrics-proxy";

/// Health check statuses that are tallied in service summaries
pub const HEALTH_PASSING: &str = "passing";
pub const HEALTH_WARNING: &str = "warning";
pub const HEALTH_CRITICAL: &str = "critical";

/// Service instance meta key naming the system that synced the instance in
pub const META_EXTERNAL_SOURCE: &str = "external-source";

/// Response headers carrying catalog query metadata
pub const HEADER_INDEX: &str = "x-catalog-index";
pub const HEADER_KNOWN_LEADER: &str = "x-catalog-knownleader";
pub const HEADER_LAST_CONTACT: &str = "x-catalog-lastcontact";

/// Error text the catalog returns while it has no elected leader
pub const ERR_NO_LEADER: &str = "No cluster leader";
