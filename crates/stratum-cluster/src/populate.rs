//! Spec population
//!
//! Population turns an address-assigned operator spec into the complete
//! configuration every downstream component reads: DNS zone resolved, etcd
//! topology laid out, subsystem defaults filled in, and the result checked
//! against every invariant. The input is never modified; any failure aborts
//! without producing output.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use stratum_common::crd::Cluster;
use stratum_common::{Error, Result, DEFAULT_DOCKER_BRIDGE, ETCD_CLUSTER_ROLES};

use crate::defaults::apply_defaults;
use crate::etcd::{build_etcd_clusters, check_etcd_topology};
use crate::registry::{ClusterRecord, ClusterRegistry};
use crate::validation::{validate_populated, validate_required_fields};

/// Knobs for population
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopulatorConfig {
    /// Etcd cluster roles to lay out when the cluster has none
    pub etcd_clusters: Vec<String>,
    /// Docker bridge used when the cluster leaves it unset
    pub docker_bridge: String,
}

impl Default for PopulatorConfig {
    fn default() -> Self {
        Self {
            etcd_clusters: ETCD_CLUSTER_ROLES.iter().map(|r| r.to_string()).collect(),
            docker_bridge: DEFAULT_DOCKER_BRIDGE.to_string(),
        }
    }
}

/// Completes cluster specs
#[derive(Clone, Debug, Default)]
pub struct SpecPopulator {
    config: PopulatorConfig,
}

impl SpecPopulator {
    /// Create a populator with the given config
    pub fn new(config: PopulatorConfig) -> Self {
        Self { config }
    }

    /// Produce the complete spec for `cluster`.
    ///
    /// Zones must already have CIDRs (see
    /// [`perform_assignments`](crate::perform_assignments)).
    #[instrument(skip_all, fields(cluster = %cluster.display_name()))]
    pub fn populate(&self, cluster: &Cluster, registry: &dyn ClusterRegistry) -> Result<Cluster> {
        validate_required_fields(cluster)?;
        let name = cluster.cluster_name().ok_or_else(|| {
            Error::validation_for_field(cluster.display_name(), "Name", "Name is required")
        })?;

        let record = registry.find(name)?;
        if let Some(record) = &record {
            check_registry_conflict(cluster, record)?;
        }

        let mut populated = cluster.clone();
        let spec = &mut populated.spec;

        if spec.dns_zone().is_none() {
            let zone = resolve_dns_zone(name, record.as_ref())?;
            debug!(dns_zone = %zone, "resolved DNS zone");
            spec.dns_zone = Some(zone);
        }

        if spec.etcd_clusters.is_empty() {
            spec.etcd_clusters = build_etcd_clusters(spec, &self.config.etcd_clusters);
            debug!(etcd_clusters = spec.etcd_clusters.len(), "built etcd topology");
        } else {
            check_etcd_topology(name, spec)?;
            debug!("kept supplied etcd topology");
        }

        apply_defaults(name, spec, &self.config.docker_bridge)?;
        debug!("applied defaults");

        validate_populated(&populated)?;

        info!(
            zones = populated.spec.zones.len(),
            dns_zone = populated.spec.dns_zone().unwrap_or_default(),
            "populated cluster spec"
        );
        Ok(populated)
    }
}

/// Populate `cluster` with the default [`PopulatorConfig`]
pub fn populate_cluster_spec(cluster: &Cluster, registry: &dyn ClusterRegistry) -> Result<Cluster> {
    SpecPopulator::default().populate(cluster, registry)
}

fn normalize_zone(zone: &str) -> String {
    zone.trim_end_matches('.').to_ascii_lowercase()
}

fn check_registry_conflict(cluster: &Cluster, record: &ClusterRecord) -> Result<()> {
    let (Some(ours), Some(theirs)) = (cluster.spec.dns_zone(), record.dns_zone()) else {
        return Ok(());
    };
    if normalize_zone(ours) != normalize_zone(theirs) {
        return Err(Error::validation_for_field(
            cluster.display_name(),
            "Name",
            format!(
                "Name {:?} is already registered under DNS zone {theirs:?}, not {ours:?}",
                record.name
            ),
        ));
    }
    Ok(())
}

fn resolve_dns_zone(name: &str, record: Option<&ClusterRecord>) -> Result<String> {
    if let Some(zone) = record.and_then(ClusterRecord::dns_zone) {
        return Ok(zone.to_string());
    }
    match name.split_once('.') {
        Some((_, parent)) if !parent.is_empty() => Ok(parent.to_string()),
        _ => Err(Error::validation_for_field(
            name,
            "DNSZone",
            format!("DNSZone is required: cannot infer one from single-label Name {name:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use stratum_common::crd::{ClusterSpec, ZoneSpec};

    use crate::registry::MockClusterRegistry;

    fn cluster(name: &str) -> Cluster {
        Cluster::new(
            name,
            ClusterSpec {
                network_cidr: Some("172.20.0.0/16".to_string()),
                non_masquerade_cidr: Some("100.64.0.0/10".to_string()),
                cloud_provider: Some("aws".to_string()),
                zones: vec![
                    ZoneSpec::with_cidr("us-east-1a", "172.20.1.0/24"),
                    ZoneSpec::with_cidr("us-east-1b", "172.20.2.0/24"),
                ],
                ..Default::default()
            },
        )
    }

    fn registry_returning(record: Option<ClusterRecord>) -> MockClusterRegistry {
        let mut registry = MockClusterRegistry::new();
        registry
            .expect_find()
            .with(eq("testcluster.test.com"))
            .times(1)
            .returning(move |_| Ok(record.clone()));
        registry
    }

    // =========================================================================
    // DNS Zone Stories
    // =========================================================================

    /// Story: A new cluster takes its DNS zone from its name
    #[test]
    fn story_dns_zone_inferred_from_name() {
        let registry = registry_returning(None);

        let populated = populate_cluster_spec(&cluster("testcluster.test.com"), &registry)
            .expect("population should succeed");

        assert_eq!(populated.spec.dns_zone(), Some("test.com"));
    }

    /// Story: A known cluster recovers the DNS zone it was registered with
    #[test]
    fn story_dns_zone_recovered_from_registry() {
        let registry = registry_returning(Some(ClusterRecord {
            name: "testcluster.test.com".to_string(),
            dns_zone: Some("internal.test.com".to_string()),
        }));

        let populated = populate_cluster_spec(&cluster("testcluster.test.com"), &registry)
            .expect("population should succeed");

        assert_eq!(populated.spec.dns_zone(), Some("internal.test.com"));
    }

    #[test]
    fn single_label_name_needs_explicit_dns_zone() {
        let mut registry = MockClusterRegistry::new();
        registry.expect_find().returning(|_| Ok(None));

        let err = populate_cluster_spec(&cluster("standalone"), &registry)
            .expect_err("no zone to infer");

        assert_eq!(err.field(), Some("DNSZone"));
    }

    // =========================================================================
    // Registry Stories
    // =========================================================================

    /// Story: The name is already taken under a different DNS zone
    #[test]
    fn story_conflicting_registration_is_rejected() {
        let registry = registry_returning(Some(ClusterRecord {
            name: "testcluster.test.com".to_string(),
            dns_zone: Some("other.com".to_string()),
        }));
        let mut input = cluster("testcluster.test.com");
        input.spec.dns_zone = Some("test.com".to_string());

        let err = populate_cluster_spec(&input, &registry).expect_err("conflict");

        assert_eq!(err.field(), Some("Name"));
        assert!(err.to_string().contains("other.com"));
    }

    #[test]
    fn matching_registration_ignores_case_and_trailing_dot() {
        let registry = registry_returning(Some(ClusterRecord {
            name: "testcluster.test.com".to_string(),
            dns_zone: Some("Test.COM.".to_string()),
        }));
        let mut input = cluster("testcluster.test.com");
        input.spec.dns_zone = Some("test.com".to_string());

        let populated = populate_cluster_spec(&input, &registry).expect("no conflict");

        assert_eq!(populated.spec.dns_zone(), Some("test.com"));
    }

    /// Story: Registry outages surface unchanged and nothing is produced
    #[test]
    fn story_registry_failure_propagates() {
        let mut registry = MockClusterRegistry::new();
        registry
            .expect_find()
            .returning(|name| Err(Error::registry_for(name, "connection refused")));

        let err = populate_cluster_spec(&cluster("testcluster.test.com"), &registry)
            .expect_err("registry down");

        match &err {
            Error::Registry { cluster, message, .. } => {
                assert_eq!(cluster, "testcluster.test.com");
                assert_eq!(message, "connection refused");
            }
            other => panic!("Expected Registry error, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_input_never_reaches_registry() {
        let mut registry = MockClusterRegistry::new();
        registry.expect_find().times(0);
        let mut input = cluster("testcluster.test.com");
        input.spec.cloud_provider = None;

        let err = populate_cluster_spec(&input, &registry).expect_err("invalid");

        assert_eq!(err.field(), Some("CloudProvider"));
    }

    // =========================================================================
    // Config Stories
    // =========================================================================

    #[test]
    fn default_config_matches_constants() {
        let config = PopulatorConfig::default();
        assert_eq!(config.etcd_clusters, vec!["main", "events"]);
        assert_eq!(config.docker_bridge, "cbr0");
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: PopulatorConfig =
            serde_json::from_str(r#"{"dockerBridge": "docker0"}"#).expect("valid config");
        assert_eq!(config.docker_bridge, "docker0");
        assert_eq!(config.etcd_clusters, vec!["main", "events"]);
    }

    /// Story: A custom role list and bridge flow into the populated spec
    #[test]
    fn story_custom_config_is_applied() {
        let registry = registry_returning(None);
        let populator = SpecPopulator::new(PopulatorConfig {
            etcd_clusters: vec!["main".to_string()],
            docker_bridge: "docker0".to_string(),
        });

        let populated = populator
            .populate(&cluster("testcluster.test.com"), &registry)
            .expect("population should succeed");

        let roles: Vec<&str> = populated
            .spec
            .etcd_clusters
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(roles, vec!["main"]);
        assert_eq!(
            populated.spec.docker.as_ref().and_then(|d| d.bridge.as_deref()),
            Some("docker0")
        );
    }

    #[test]
    fn input_is_not_modified() {
        let registry = registry_returning(None);
        let input = cluster("testcluster.test.com");
        let before = input.clone();

        let populated = populate_cluster_spec(&input, &registry).expect("populates");

        assert_eq!(input, before);
        assert_ne!(populated, before);
    }
}
