//! Resource definitions for Stratum
//!
//! The `Cluster` resource is what operators author and what the populator
//! hands to downstream provisioning once every field is resolved.

mod cluster;
mod types;

pub use cluster::{Cluster, ClusterSpec};
pub use types::{DockerConfig, EtcdClusterSpec, EtcdMemberSpec, KubeletConfig, ZoneSpec};
