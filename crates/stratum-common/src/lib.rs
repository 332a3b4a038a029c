//! Common types for Stratum: the Cluster resource, errors, and utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod telemetry;
pub mod yaml;

pub use error::{Error, UNKNOWN_CONTEXT};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Bridge the container runtime attaches pods to when none is configured
pub const DEFAULT_DOCKER_BRIDGE: &str = "cbr0";

/// Etcd cluster roles every control plane runs.
///
/// `main` holds primary cluster state, `events` holds the event stream.
pub const ETCD_CLUSTER_ROLES: &[&str] = &["main", "events"];

/// Extra prefix bits used to carve the service range out of the
/// non-masquerade CIDR (one eighth of it).
pub const SERVICE_RANGE_PREFIX_BITS: u8 = 3;

/// Extra prefix bits used to carve the pod range out of the
/// non-masquerade CIDR (its upper half).
pub const POD_RANGE_PREFIX_BITS: u8 = 1;
