//! Cluster spec completion for Stratum
//!
//! Operators author a partial [`Cluster`](stratum_common::crd::Cluster);
//! this crate turns it into the complete spec the rest of the system reads.
//! Completion happens in two explicit phases:
//!
//! 1. [`perform_assignments`] gives every zone without a CIDR a block of the
//!    cluster network, editing the cluster in place.
//! 2. [`populate_cluster_spec`] (or [`SpecPopulator::populate`]) resolves the
//!    DNS zone, lays out etcd, fills defaults and validates the result,
//!    returning a new cluster and leaving the input untouched.

#![deny(missing_docs)]

pub mod assignments;
pub mod defaults;
pub mod etcd;
pub mod network;
pub mod populate;
pub mod registry;
pub mod validation;

pub use assignments::perform_assignments;
pub use etcd::{build_etcd_clusters, check_etcd_topology};
pub use populate::{populate_cluster_spec, PopulatorConfig, SpecPopulator};
pub use registry::{ClusterRecord, ClusterRegistry, InMemoryClusterRegistry};
pub use validation::{validate_populated, validate_required_fields};
