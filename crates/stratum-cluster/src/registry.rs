//! Cluster registry
//!
//! The registry resolves cluster records by name. Population only needs to
//! read from it (to detect conflicting records and recover a DNS zone); how
//! records are stored is up to the implementation.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use stratum_common::crd::Cluster;
use stratum_common::{Error, Result};

#[cfg(test)]
use mockall::automock;

/// What the registry knows about an existing cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Cluster name
    pub name: String,
    /// DNS zone the cluster was registered under
    pub dns_zone: Option<String>,
}

impl ClusterRecord {
    /// Build a record from a cluster; `None` if the cluster has no name
    pub fn from_cluster(cluster: &Cluster) -> Option<Self> {
        Some(Self {
            name: cluster.cluster_name()?.to_string(),
            dns_zone: cluster.spec.dns_zone().map(str::to_string),
        })
    }

    /// The recorded DNS zone, treating an empty string as unset
    pub fn dns_zone(&self) -> Option<&str> {
        self.dns_zone.as_deref().filter(|z| !z.is_empty())
    }
}

/// Read access to cluster records
///
/// Implementations may be backed by memory, files, or a remote store.
/// Failures should be reported as [`Error::Registry`]; population passes them
/// through unchanged and never retries.
#[cfg_attr(test, automock)]
pub trait ClusterRegistry: Send + Sync {
    /// Find the record for a cluster by name
    fn find(&self, name: &str) -> Result<Option<ClusterRecord>>;
}

/// Registry held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryClusterRegistry {
    records: RwLock<BTreeMap<String, ClusterRecord>>,
}

impl InMemoryClusterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the given clusters
    pub fn with_clusters<'a>(clusters: impl IntoIterator<Item = &'a Cluster>) -> Result<Self> {
        let registry = Self::new();
        for cluster in clusters {
            registry.register(cluster)?;
        }
        Ok(registry)
    }

    /// Record a cluster, replacing any previous record with the same name
    pub fn register(&self, cluster: &Cluster) -> Result<()> {
        let record = ClusterRecord::from_cluster(cluster).ok_or_else(|| {
            Error::validation_for_field(
                cluster.display_name(),
                "Name",
                "Name is required to register a cluster",
            )
        })?;
        self.records.write().insert(record.name.clone(), record);
        Ok(())
    }

    /// Number of registered clusters
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the registry has no clusters
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ClusterRegistry for InMemoryClusterRegistry {
    fn find(&self, name: &str) -> Result<Option<ClusterRecord>> {
        Ok(self.records.read().get(name).cloned())
    }
}
