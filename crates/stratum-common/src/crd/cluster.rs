//! Cluster resource definition
//!
//! A Cluster describes the target state of a compute cluster: its network
//! ranges, availability zones, cloud provider and control plane posture.
//! Operators author it partially; the populator fills in everything else.

use std::collections::BTreeSet;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{DockerConfig, EtcdClusterSpec, KubeletConfig, ZoneSpec};
use crate::UNKNOWN_CONTEXT;

/// Specification for a Cluster
///
/// Every field the populator inspects is optional so that "left unset by the
/// operator" is distinguishable from an explicit value. Empty strings are
/// treated the same as unset.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "stratum.dev",
    version = "v1alpha1",
    kind = "Cluster",
    plural = "clusters",
    shortname = "scl",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Cloud","type":"string","jsonPath":".spec.cloudProvider"}"#,
    printcolumn = r#"{"name":"Network","type":"string","jsonPath":".spec.networkCIDR"}"#,
    printcolumn = r#"{"name":"DNS Zone","type":"string","jsonPath":".spec.dnsZone"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Address space for the whole cluster (e.g., "172.20.0.0/16")
    #[serde(
        rename = "networkCIDR",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub network_cidr: Option<String>,

    /// Address space excluded from NAT (e.g., "100.64.0.0/10")
    #[serde(
        rename = "nonMasqueradeCIDR",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub non_masquerade_cidr: Option<String>,

    /// Cloud provider identifier (e.g., "aws")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,

    /// DNS domain the cluster's records live under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_zone: Option<String>,

    /// Lock down debugging and CIDR reconciliation on control plane nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolate_masters: Option<bool>,

    /// Availability zones, in the order the operator listed them
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,

    /// Container runtime configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,

    /// Etcd clusters backing the control plane
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub etcd_clusters: Vec<EtcdClusterSpec>,

    /// Node agent configuration for control plane nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_kubelet: Option<KubeletConfig>,

    /// Service VIP range, carved from the non-masquerade CIDR
    #[serde(
        rename = "serviceClusterIPRange",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_cluster_ip_range: Option<String>,

    /// Pod address range, carved from the non-masquerade CIDR
    #[serde(rename = "podCIDR", default, skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ClusterSpec {
    /// The cluster network CIDR, if set
    pub fn network_cidr(&self) -> Option<&str> {
        non_empty(&self.network_cidr)
    }

    /// The non-masquerade CIDR, if set
    pub fn non_masquerade_cidr(&self) -> Option<&str> {
        non_empty(&self.non_masquerade_cidr)
    }

    /// The cloud provider, if set
    pub fn cloud_provider(&self) -> Option<&str> {
        non_empty(&self.cloud_provider)
    }

    /// The DNS zone, if set
    pub fn dns_zone(&self) -> Option<&str> {
        non_empty(&self.dns_zone)
    }

    /// The service range, if set
    pub fn service_cluster_ip_range(&self) -> Option<&str> {
        non_empty(&self.service_cluster_ip_range)
    }

    /// The pod range, if set
    pub fn pod_cidr(&self) -> Option<&str> {
        non_empty(&self.pod_cidr)
    }

    /// Distinct zone names in lexicographic order
    pub fn zone_names(&self) -> BTreeSet<&str> {
        self.zones.iter().map(|z| z.name.as_str()).collect()
    }
}

impl Cluster {
    /// The cluster name, treating an empty name as unset
    pub fn cluster_name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|n| !n.is_empty())
    }

    /// The cluster name for logs and error context
    pub fn display_name(&self) -> &str {
        self.cluster_name().unwrap_or(UNKNOWN_CONTEXT)
    }
}
