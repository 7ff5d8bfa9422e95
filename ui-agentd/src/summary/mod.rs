pub mod gateway;

use std::collections::HashMap;
use shared::protocol::{HEALTH_CRITICAL, HEALTH_PASSING, HEALTH_WARNING, META_EXTERNAL_SOURCE};
use shared::types::{ServiceDumpEntry, ServiceId, ServiceKind, ServiceSummary};
use crate::config::DnsConfig;

/// Working state for one aggregation pass. Built fresh per call and
/// consumed by `finish`.
#[derive(Default)]
struct Summaries {
    /// First-seen order of service IDs
    ids: Vec<ServiceId>,
    by_id: HashMap<ServiceId, ServiceSummary>,
}

impl Summaries {
    fn get_or_create(&mut self, id: ServiceId) -> &mut ServiceSummary {
        if !self.by_id.contains_key(&id) {
            self.ids.push(id.clone());
        }
        self.by_id
            .entry(id)
            .or_insert_with_key(ServiceSummary::new)
    }

    fn finish(mut self) -> Vec<ServiceSummary> {
        self.ids.sort();
        self.ids
            .iter()
            .filter_map(|id| self.by_id.remove(id))
            .map(|mut sum| {
                // Nodes keep their duplicates; only the order is normalised
                sum.nodes.sort();
                sum.tags.sort();
                sum
            })
            .collect()
    }
}

/// Fold a raw service dump into one summary per logical service.
///
/// Output is ordered by service ID and depends only on the input order, so
/// identical dumps always produce identical summaries.
pub fn summarize_services(
    dump: &[ServiceDumpEntry],
    dns: &DnsConfig,
    datacenter: &str,
) -> Vec<ServiceSummary> {
    let mut summaries = Summaries::default();

    for entry in dump {
        if let Some(gw) = &entry.gateway_service {
            let sum = summaries.get_or_create(gw.service.to_service_id());
            gateway::extend_gateway_addresses(sum, gw, dns, datacenter);
        }

        // Gateway associations without a registered instance stop here
        let Some(svc) = &entry.service else {
            continue;
        };
        let sum = summaries.get_or_create(svc.service_id());

        sum.nodes.push(entry.node.node.clone());
        sum.kind = svc.kind;
        sum.instance_count += 1;

        if svc.kind == ServiceKind::ConnectProxy {
            sum.proxy_for.insert(svc.proxy.destination_service_name.clone());
        }

        for tag in &svc.tags {
            if !sum.tags.contains(tag) {
                sum.tags.push(tag.clone());
            }
        }

        if let Some(source) = svc.meta.get(META_EXTERNAL_SOURCE) {
            if !source.is_empty() {
                sum.external_sources.insert(source.clone());
            }
        }

        for check in &entry.checks {
            match check.status.as_str() {
                HEALTH_PASSING => sum.checks_passing += 1,
                HEALTH_WARNING => sum.checks_warning += 1,
                HEALTH_CRITICAL => sum.checks_critical += 1,
                _ => {}
            }
        }
    }

    summaries.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use shared::types::{GatewayService, HealthCheck, Node, NodeService, ProxyConfig, ServiceName};

    fn dns() -> DnsConfig {
        DnsConfig {
            domain: "consul.".to_string(),
            alt_domain: String::new(),
        }
    }

    fn instance(node: &str, name: &str, tags: &[&str]) -> ServiceDumpEntry {
        ServiceDumpEntry {
            node: Node {
                node: node.to_string(),
            },
            service: Some(NodeService {
                id: format!("{}-{}", name, node),
                name: name.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn proxy(node: &str, name: &str, destination: &str) -> ServiceDumpEntry {
        let mut entry = instance(node, name, &[]);
        if let Some(svc) = entry.service.as_mut() {
            svc.kind = ServiceKind::ConnectProxy;
            svc.proxy = ProxyConfig {
                destination_service_name: destination.to_string(),
            };
        }
        entry
    }

    fn check(status: &str) -> HealthCheck {
        HealthCheck {
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn gateway_only(service: &str, port: u16, hosts: &[&str]) -> ServiceDumpEntry {
        ServiceDumpEntry {
            gateway_service: Some(GatewayService {
                gateway: ServiceName {
                    name: "ingress".to_string(),
                    ..Default::default()
                },
                service: ServiceName {
                    name: service.to_string(),
                    ..Default::default()
                },
                port,
                hosts: hosts.iter().map(|h| h.to_string()).collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_instances_merge_into_one_summary() {
        let dump = vec![
            instance("n1", "web", &["a", "b"]),
            instance("n2", "web", &["a", "b"]),
            instance("n1", "web", &["b", "c"]),
        ];

        let out = summarize_services(&dump, &dns(), "dc1");

        assert_eq!(out.len(), 1);
        let web = &out[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.instance_count, 3);
        assert_eq!(web.nodes, vec!["n1", "n1", "n2"]);
        assert_eq!(web.tags, vec!["a", "b", "c"]);
        assert_eq!(web.kind, ServiceKind::Typical);
    }

    #[test]
    fn test_proxy_destination_recorded_once() {
        let dump = vec![
            proxy("n1", "db-proxy", "db"),
            proxy("n2", "db-proxy", "db"),
            proxy("n3", "db-proxy", "db-replica"),
        ];

        let out = summarize_services(&dump, &dns(), "dc1");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ServiceKind::ConnectProxy);
        assert_eq!(out[0].proxy_for.as_slice(), &["db", "db-replica"]);
    }

    #[test]
    fn test_non_proxy_kinds_never_populate_proxy_for() {
        let mut entry = instance("n1", "api", &[]);
        if let Some(svc) = entry.service.as_mut() {
            svc.proxy.destination_service_name = "db".to_string();
        }

        let out = summarize_services(&[entry], &dns(), "dc1");
        assert!(out[0].proxy_for.is_empty());
    }

    #[test]
    fn test_output_sorted_by_service_id() {
        let mut scoped = instance("n1", "web", &[]);
        if let Some(svc) = scoped.service.as_mut() {
            svc.partition = "p2".to_string();
        }
        let mut namespaced = instance("n1", "web", &[]);
        if let Some(svc) = namespaced.service.as_mut() {
            svc.partition = "p1".to_string();
            svc.namespace = "zeta".to_string();
        }
        let dump = vec![
            instance("n1", "web", &[]),
            scoped,
            instance("n9", "cache", &[]),
            namespaced,
            instance("n4", "api", &[]),
        ];

        let out = summarize_services(&dump, &dns(), "dc1");
        let ids: Vec<ServiceId> = out.iter().map(|s| s.service_id()).collect();

        assert_eq!(
            ids,
            vec![
                ServiceId::new("api", "", ""),
                ServiceId::new("cache", "", ""),
                ServiceId::new("web", "", ""),
                ServiceId::new("web", "p1", "zeta"),
                ServiceId::new("web", "p2", ""),
            ]
        );
    }

    #[test]
    fn test_nodes_and_tags_sorted_but_sources_keep_first_seen_order() {
        let mut first = instance("zed", "web", &["v2", "prod"]);
        let mut second = instance("alpha", "web", &["canary"]);
        let mut third = instance("mid", "web", &[]);
        for (entry, source) in [(&mut first, "kubernetes"), (&mut second, "aws"), (&mut third, "kubernetes")] {
            if let Some(svc) = entry.service.as_mut() {
                svc.meta = HashMap::from([(META_EXTERNAL_SOURCE.to_string(), source.to_string())]);
            }
        }

        let out = summarize_services(&[first, second, third], &dns(), "dc1");

        assert_eq!(out[0].nodes, vec!["alpha", "mid", "zed"]);
        assert_eq!(out[0].tags, vec!["canary", "prod", "v2"]);
        assert_eq!(out[0].external_sources.as_slice(), &["kubernetes", "aws"]);
    }

    #[test]
    fn test_empty_external_source_ignored() {
        let mut entry = instance("n1", "web", &[]);
        if let Some(svc) = entry.service.as_mut() {
            svc.meta = HashMap::from([
                (META_EXTERNAL_SOURCE.to_string(), String::new()),
                ("version".to_string(), "1.2".to_string()),
            ]);
        }

        let out = summarize_services(&[entry], &dns(), "dc1");
        assert!(out[0].external_sources.is_empty());
    }

    #[test]
    fn test_check_statuses_counted_and_unknown_dropped() {
        let mut a = instance("n1", "web", &[]);
        a.checks = vec![check("passing"), check("critical"), check("maintenance")];
        let mut b = instance("n2", "web", &[]);
        b.checks = vec![check("passing"), check("warning"), check("")];

        let out = summarize_services(&[a, b], &dns(), "dc1");

        assert_eq!(out[0].checks_passing, 2);
        assert_eq!(out[0].checks_warning, 1);
        assert_eq!(out[0].checks_critical, 1);
    }

    #[test]
    fn test_gateway_only_records_add_addresses_but_no_instances() {
        let dump = vec![
            gateway_only("web", 8080, &[]),
            gateway_only("web", 8080, &[]),
            gateway_only("api", 9090, &["api.example.com"]),
        ];

        let out = summarize_services(&dump, &dns(), "dc1");

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "api");
        assert_eq!(out[0].instance_count, 0);
        assert!(out[0].nodes.is_empty());
        assert_eq!(out[0].gateway_config.addresses.as_slice(), &["api.example.com:9090"]);

        assert_eq!(out[1].name, "web");
        assert_eq!(out[1].instance_count, 0);
        assert_eq!(out[1].gateway_config.addresses.as_slice(), &["web.ingress.dc1.consul:8080"]);
    }

    #[test]
    fn test_gateway_record_with_instance_counts_once() {
        let mut entry = instance("n1", "web", &["v1"]);
        entry.gateway_service = gateway_only("web", 443, &["web.example.com"]).gateway_service;

        let out = summarize_services(&[entry.clone(), entry], &dns(), "dc1");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].instance_count, 2);
        assert_eq!(out[0].nodes, vec!["n1", "n1"]);
        assert_eq!(out[0].gateway_config.addresses.as_slice(), &["web.example.com:443"]);
    }

    #[test]
    fn test_identical_input_gives_identical_output() {
        let mut dump = vec![
            instance("n2", "web", &["b", "a"]),
            proxy("n1", "web-proxy", "web"),
            gateway_only("web", 8080, &[]),
            instance("n1", "api", &["x"]),
        ];
        dump[0].checks = vec![check("passing"), check("warning")];

        let first = serde_json::to_string(&summarize_services(&dump, &dns(), "dc1")).unwrap();
        let second = serde_json::to_string(&summarize_services(&dump, &dns(), "dc1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_dump() {
        assert!(summarize_services(&[], &dns(), "dc1").is_empty());
    }
}
