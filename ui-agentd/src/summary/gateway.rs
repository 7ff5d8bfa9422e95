use shared::types::{GatewayService, ServiceName, ServiceSummary};
use crate::config::DnsConfig;

/// Extend `sum`'s gateway addresses with everything `gateway_service` is
/// reachable at. Addresses already recorded for the summary are skipped.
pub fn extend_gateway_addresses(
    sum: &mut ServiceSummary,
    gateway_service: &GatewayService,
    dns: &DnsConfig,
    datacenter: &str,
) {
    let dns_names: Vec<String> = [dns.domain.as_str(), dns.alt_domain.as_str()]
        .into_iter()
        // An unconfigured domain can't produce a usable name
        .filter(|domain| !domain.is_empty())
        .map(|domain| ingress_dns_name(&gateway_service.service, datacenter, domain))
        .collect();

    for addr in gateway_service.addresses(&dns_names) {
        sum.gateway_config.addresses.insert(addr);
    }
}

/// DNS name addressing `service` through an ingress gateway.
///
/// Namespace and partition labels are only emitted when they differ from
/// the default.
pub fn ingress_dns_name(service: &ServiceName, datacenter: &str, domain: &str) -> String {
    let mut name = format!("{}.ingress.", service.name);
    if !is_default(&service.namespace) {
        name.push_str(&format!("{}.ns.", service.namespace));
    }
    if !is_default(&service.partition) {
        name.push_str(&format!("{}.ap.", service.partition));
    }
    name.push_str(&format!("{}.{}", datacenter, domain.trim_end_matches('.')));
    name
}

fn is_default(value: &str) -> bool {
    value.is_empty() || value == "default"
}
