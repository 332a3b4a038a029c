//! Error types for Stratum
//!
//! Errors are structured with fields to aid debugging. Each variant carries
//! the cluster it belongs to and enough context (field name, network range,
//! etcd cluster) for an operator to fix the input without re-running anything.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for cluster spec population
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing, empty, or malformed
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid; always names the offending field
        message: String,
        /// The invalid field (e.g., "NetworkCIDR")
        field: Option<String>,
    },

    /// A network range cannot be split into the blocks it has to hold
    #[error("address space exhausted in {network} ({blocks} block(s)): {message}")]
    AddressSpaceExhausted {
        /// The range that was being subdivided
        network: String,
        /// Number of equal blocks the range was split into
        blocks: usize,
        /// Description of what ran out
        message: String,
    },

    /// The etcd member set diverges from the zone set
    #[error("etcd topology inconsistency in {cluster} (etcd cluster {etcd_cluster}): {message}")]
    TopologyInconsistency {
        /// Name of the cluster
        cluster: String,
        /// Name of the offending etcd cluster
        etcd_cluster: String,
        /// Description of the mismatch
        message: String,
    },

    /// The cluster registry lookup failed
    #[error("registry error for {cluster}: {message}")]
    Registry {
        /// Name of the cluster being looked up
        cluster: String,
        /// Description of what failed
        message: String,
        /// Whether the registry considers this failure transient
        retryable: bool,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create a validation error with cluster context and field name
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an address-space exhaustion error
    pub fn address_space_exhausted(
        network: impl Into<String>,
        blocks: usize,
        msg: impl Into<String>,
    ) -> Self {
        Self::AddressSpaceExhausted {
            network: network.into(),
            blocks,
            message: msg.into(),
        }
    }

    /// Create a topology inconsistency error for one etcd cluster
    pub fn topology_inconsistency(
        cluster: impl Into<String>,
        etcd_cluster: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::TopologyInconsistency {
            cluster: cluster.into(),
            etcd_cluster: etcd_cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a registry error with cluster context
    ///
    /// Registry errors are transient by default (network or disk hiccups).
    pub fn registry_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Registry {
            cluster: cluster.into(),
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Check if this error is retryable
    ///
    /// Only registry failures can be transient; everything else requires the
    /// operator to fix the cluster spec. Population itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Registry { retryable, .. } => *retryable,
            Error::Validation { .. }
            | Error::AddressSpaceExhausted { .. }
            | Error::TopologyInconsistency { .. }
            | Error::Serialization { .. } => false,
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::Validation { cluster, .. } => Some(cluster),
            Error::TopologyInconsistency { cluster, .. } => Some(cluster),
            Error::Registry { cluster, .. } => Some(cluster),
            Error::AddressSpaceExhausted { .. } => None,
            Error::Serialization { .. } => None,
        }
    }

    /// Get the offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
