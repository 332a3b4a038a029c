//! Supporting types for the Cluster resource

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An availability zone and the subnet the cluster uses inside it
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ZoneSpec {
    /// Zone name (e.g., "us-east-1a")
    pub name: String,

    /// Subnet for this zone; assigned from the network CIDR when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
}

impl ZoneSpec {
    /// Create a zone without a subnet (to be assigned)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: None,
        }
    }

    /// Create a zone with an explicit subnet
    pub fn with_cidr(name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: Some(cidr.into()),
        }
    }

    /// The zone's subnet, treating an empty string as unset
    pub fn cidr(&self) -> Option<&str> {
        self.cidr.as_deref().filter(|c| !c.is_empty())
    }
}

/// Container runtime configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    /// MTU for the container bridge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,

    /// Registry the runtime may pull from without TLS (e.g., "myregistry.com:1234")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_registry: Option<String>,

    /// Bridge pods attach to (default: cbr0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

/// A named etcd cluster and its members
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct EtcdClusterSpec {
    /// Role of this etcd cluster (e.g., "main", "events")
    pub name: String,

    /// Members, one per zone
    #[serde(default)]
    pub members: Vec<EtcdMemberSpec>,
}

/// A single etcd member pinned to a zone
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct EtcdMemberSpec {
    /// Member name; always the zone name
    pub name: String,

    /// Zone the member runs in
    pub zone: String,
}

impl EtcdMemberSpec {
    /// Create the member for a zone
    pub fn for_zone(zone: impl Into<String>) -> Self {
        let zone = zone.into();
        Self {
            name: zone.clone(),
            zone,
        }
    }
}

/// Node agent configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfig {
    /// Serve the debugging handlers (exec, logs, port-forward)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_debugging_handlers: Option<bool>,

    /// Let the kubelet reconcile its pod CIDR from the API server
    #[serde(
        rename = "reconcileCIDR",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reconcile_cidr: Option<bool>,
}
