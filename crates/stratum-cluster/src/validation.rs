//! Cluster spec validation
//!
//! Two passes: [`validate_required_fields`] runs on operator input before
//! anything is derived, and [`validate_populated`] checks the finished spec
//! before it is handed back.

use std::collections::BTreeSet;

use ipnet::Ipv4Net;
use stratum_common::crd::Cluster;
use stratum_common::{Error, Result};

use crate::etcd::check_etcd_topology;
use crate::network::{overlaps, parse_cidr};

/// Check the fields population cannot do without.
///
/// Fields are checked in a fixed order (Name, Zones, NetworkCIDR,
/// NonMasqueradeCIDR, CloudProvider) and the first missing one is reported.
pub fn validate_required_fields(cluster: &Cluster) -> Result<()> {
    let name = cluster.display_name();
    let spec = &cluster.spec;

    if cluster.cluster_name().is_none() {
        return Err(Error::validation_for_field(name, "Name", "Name is required"));
    }
    if spec.zones.is_empty() {
        return Err(Error::validation_for_field(
            name,
            "Zone",
            "at least one Zone is required",
        ));
    }
    if spec.network_cidr().is_none() {
        return Err(Error::validation_for_field(
            name,
            "NetworkCIDR",
            "NetworkCIDR is required",
        ));
    }
    if spec.non_masquerade_cidr().is_none() {
        return Err(Error::validation_for_field(
            name,
            "NonMasqueradeCIDR",
            "NonMasqueradeCIDR is required",
        ));
    }
    if spec.cloud_provider().is_none() {
        return Err(Error::validation_for_field(
            name,
            "CloudProvider",
            "CloudProvider is required",
        ));
    }

    let mut seen = BTreeSet::new();
    for zone in &spec.zones {
        if zone.name.is_empty() {
            return Err(Error::validation_for_field(
                name,
                "Zone",
                "Zone name must not be empty",
            ));
        }
        if !seen.insert(zone.name.as_str()) {
            return Err(Error::validation_for_field(
                name,
                "Zone",
                format!("Zone {:?} is listed more than once", zone.name),
            ));
        }
    }

    Ok(())
}

/// Check every invariant of a fully populated spec
pub fn validate_populated(cluster: &Cluster) -> Result<()> {
    validate_required_fields(cluster)?;

    let name = cluster.display_name();
    let spec = &cluster.spec;

    if spec.dns_zone().is_none() {
        return Err(Error::validation_for_field(name, "DNSZone", "DNSZone is required"));
    }

    let network = required_cidr(name, "NetworkCIDR", spec.network_cidr())?;
    let non_masquerade = required_cidr(name, "NonMasqueradeCIDR", spec.non_masquerade_cidr())?;
    if overlaps(&network, &non_masquerade) {
        return Err(Error::validation_for_field(
            name,
            "NonMasqueradeCIDR",
            format!("NonMasqueradeCIDR {non_masquerade} overlaps NetworkCIDR {network}"),
        ));
    }

    validate_zone_subnets(name, cluster, network)?;

    let service_range = required_cidr(
        name,
        "ServiceClusterIPRange",
        spec.service_cluster_ip_range(),
    )?;
    let pod_range = required_cidr(name, "PodCIDR", spec.pod_cidr())?;
    for (field, range) in [("ServiceClusterIPRange", service_range), ("PodCIDR", pod_range)] {
        if !non_masquerade.contains(&range) {
            return Err(Error::validation_for_field(
                name,
                field,
                format!("{field} {range} is outside NonMasqueradeCIDR {non_masquerade}"),
            ));
        }
    }
    if overlaps(&service_range, &pod_range) {
        return Err(Error::validation_for_field(
            name,
            "PodCIDR",
            format!("PodCIDR {pod_range} overlaps ServiceClusterIPRange {service_range}"),
        ));
    }

    let bridge_set = spec
        .docker
        .as_ref()
        .and_then(|d| d.bridge.as_deref())
        .is_some_and(|b| !b.is_empty());
    if !bridge_set {
        return Err(Error::validation_for_field(
            name,
            "Docker.Bridge",
            "Docker.Bridge is required",
        ));
    }

    let kubelet_set = spec
        .master_kubelet
        .as_ref()
        .is_some_and(|k| k.enable_debugging_handlers.is_some() && k.reconcile_cidr.is_some());
    if !kubelet_set {
        return Err(Error::validation_for_field(
            name,
            "MasterKubelet",
            "MasterKubelet flags must both be resolved",
        ));
    }
    if spec.isolate_masters.is_none() {
        return Err(Error::validation_for_field(
            name,
            "IsolateMasters",
            "IsolateMasters must be resolved",
        ));
    }

    check_etcd_topology(name, spec)
}

fn required_cidr(cluster: &str, field: &str, value: Option<&str>) -> Result<Ipv4Net> {
    let value = value.ok_or_else(|| {
        Error::validation_for_field(cluster, field, format!("{field} is required"))
    })?;
    parse_cidr(cluster, field, value)
}

fn validate_zone_subnets(cluster_name: &str, cluster: &Cluster, network: Ipv4Net) -> Result<()> {
    let mut subnets: Vec<(&str, Ipv4Net)> = Vec::with_capacity(cluster.spec.zones.len());

    for zone in &cluster.spec.zones {
        let value = zone.cidr().ok_or_else(|| {
            Error::validation_for_field(
                cluster_name,
                "Zone",
                format!("Zone {:?} has no CIDR", zone.name),
            )
        })?;
        let subnet = parse_cidr(cluster_name, "Zone", value)?;
        if !network.contains(&subnet) {
            return Err(Error::validation_for_field(
                cluster_name,
                "Zone",
                format!(
                    "Zone {:?} CIDR {subnet} is outside NetworkCIDR {network}",
                    zone.name
                ),
            ));
        }
        if let Some((other, _)) = subnets.iter().find(|(_, s)| overlaps(s, &subnet)) {
            return Err(Error::validation_for_field(
                cluster_name,
                "Zone",
                format!("Zone {:?} CIDR {subnet} overlaps Zone {other:?}", zone.name),
            ));
        }
        subnets.push((zone.name.as_str(), subnet));
    }

    Ok(())
}
