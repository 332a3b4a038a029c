//! Subsystem defaults
//!
//! Defaults only ever fill fields the operator left unset. An explicit value,
//! even one that disagrees with the default, is always kept.

use stratum_common::crd::{ClusterSpec, DockerConfig, KubeletConfig};
use stratum_common::{Error, Result, POD_RANGE_PREFIX_BITS, SERVICE_RANGE_PREFIX_BITS};
use tracing::debug;

use crate::network::{parse_cidr, subdivide};

/// Control plane kubelet posture, keyed on master isolation.
///
/// Both flags move together: isolated masters lock down introspection and
/// CIDR reconciliation, everything else keeps them on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterKubeletPolicy {
    /// Serve kubelet debugging handlers
    pub enable_debugging_handlers: bool,
    /// Reconcile the node pod CIDR
    pub reconcile_cidr: bool,
}

impl MasterKubeletPolicy {
    /// Policy for the given isolation setting (unset means not isolated)
    pub fn for_isolation(isolate_masters: Option<bool>) -> Self {
        let open = !isolate_masters.unwrap_or(false);
        Self {
            enable_debugging_handlers: open,
            reconcile_cidr: open,
        }
    }
}

/// Fill unset Docker fields; MTU and insecure registry pass through as-is
pub fn resolve_docker(docker: Option<&DockerConfig>, default_bridge: &str) -> DockerConfig {
    let mut resolved = docker.cloned().unwrap_or_default();
    if resolved.bridge.as_deref().unwrap_or_default().is_empty() {
        resolved.bridge = Some(default_bridge.to_string());
    }
    resolved
}

/// Resolve the control plane kubelet flags from the isolation policy
pub fn resolve_master_kubelet(
    isolate_masters: Option<bool>,
    existing: Option<&KubeletConfig>,
) -> KubeletConfig {
    let policy = MasterKubeletPolicy::for_isolation(isolate_masters);
    let existing = existing.cloned().unwrap_or_default();

    KubeletConfig {
        enable_debugging_handlers: Some(
            existing
                .enable_debugging_handlers
                .unwrap_or(policy.enable_debugging_handlers),
        ),
        reconcile_cidr: Some(existing.reconcile_cidr.unwrap_or(policy.reconcile_cidr)),
    }
}

/// Carve the service and pod ranges out of the non-masquerade CIDR.
///
/// The service range is the first eighth (100.64.0.0/13 of 100.64.0.0/10)
/// and the pod range is the upper half (100.96.0.0/11).
pub fn resolve_service_ranges(cluster: &str, spec: &mut ClusterSpec) -> Result<()> {
    if spec.service_cluster_ip_range().is_some() && spec.pod_cidr().is_some() {
        return Ok(());
    }

    let value = spec.non_masquerade_cidr().ok_or_else(|| {
        Error::validation_for_field(cluster, "NonMasqueradeCIDR", "NonMasqueradeCIDR is required")
    })?;
    let non_masquerade = parse_cidr(cluster, "NonMasqueradeCIDR", value)?;

    let exhausted = || {
        Error::address_space_exhausted(
            non_masquerade.to_string(),
            1usize << SERVICE_RANGE_PREFIX_BITS,
            "NonMasqueradeCIDR is too small to hold service and pod ranges",
        )
    };
    let service_range = subdivide(non_masquerade, u32::from(SERVICE_RANGE_PREFIX_BITS))
        .and_then(|blocks| blocks.first().copied())
        .ok_or_else(exhausted)?;
    let pod_range = subdivide(non_masquerade, u32::from(POD_RANGE_PREFIX_BITS))
        .and_then(|blocks| blocks.last().copied())
        .ok_or_else(exhausted)?;

    if spec.service_cluster_ip_range().is_none() {
        debug!(cluster, range = %service_range, "defaulted service cluster IP range");
        spec.service_cluster_ip_range = Some(service_range.to_string());
    }
    if spec.pod_cidr().is_none() {
        debug!(cluster, range = %pod_range, "defaulted pod CIDR");
        spec.pod_cidr = Some(pod_range.to_string());
    }
    Ok(())
}

/// Apply every subsystem default to a spec
pub fn apply_defaults(cluster: &str, spec: &mut ClusterSpec, docker_bridge: &str) -> Result<()> {
    spec.docker = Some(resolve_docker(spec.docker.as_ref(), docker_bridge));
    spec.master_kubelet = Some(resolve_master_kubelet(
        spec.isolate_masters,
        spec.master_kubelet.as_ref(),
    ));
    spec.isolate_masters = Some(spec.isolate_masters.unwrap_or(false));
    resolve_service_ranges(cluster, spec)
}
