//! Address assignment for zones
//!
//! Zones may be authored without a CIDR. Before population, every such zone
//! gets an equal-sized block of the cluster network, handed out in address
//! order to the zones in the order they were listed. Zones that already have
//! a CIDR keep it, and no assigned block overlaps one of them.
//!
//! Assignment mutates the cluster in place; population is a separate step.

use ipnet::Ipv4Net;
use tracing::debug;

use stratum_common::crd::Cluster;
use stratum_common::{Error, Result};

use crate::network::{overlaps, parse_cidr, prefix_bits_for, subdivide};

/// Fill in every unset zone CIDR from the cluster's NetworkCIDR.
///
/// The network is split into the smallest power-of-two number of equal
/// blocks that covers all zones (three zones in a /16 get /18 blocks).
/// Given the same input this always produces the same assignment.
///
/// Does nothing, and does not inspect NetworkCIDR, when every zone already
/// has a CIDR.
pub fn perform_assignments(cluster: &mut Cluster) -> Result<()> {
    let cluster_name = cluster.display_name().to_string();
    let spec = &mut cluster.spec;

    let pending: Vec<usize> = spec
        .zones
        .iter()
        .enumerate()
        .filter(|(_, zone)| zone.cidr().is_none())
        .map(|(idx, _)| idx)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let network_value = spec.network_cidr().ok_or_else(|| {
        Error::validation_for_field(
            &cluster_name,
            "NetworkCIDR",
            "NetworkCIDR is required to assign zone subnets",
        )
    })?;
    let network = parse_cidr(&cluster_name, "NetworkCIDR", network_value)?;

    let zone_count = spec.zones.len();
    let bits = prefix_bits_for(zone_count);
    let block_count = 1usize.checked_shl(bits).unwrap_or(usize::MAX);
    let blocks = subdivide(network, bits).ok_or_else(|| {
        Error::address_space_exhausted(
            network.to_string(),
            block_count,
            format!("{zone_count} zone(s) need blocks smaller than /32"),
        )
    })?;

    let mut taken: Vec<Ipv4Net> = Vec::with_capacity(zone_count);
    for zone in &spec.zones {
        if let Some(cidr) = zone.cidr() {
            taken.push(parse_cidr(&cluster_name, "Zone", cidr)?);
        }
    }

    let mut candidates = blocks.into_iter();
    let mut assigned: Vec<(usize, Ipv4Net)> = Vec::with_capacity(pending.len());
    for idx in pending {
        let block = candidates
            .by_ref()
            .find(|block| !taken.iter().any(|t| overlaps(t, block)))
            .ok_or_else(|| {
                Error::address_space_exhausted(
                    network.to_string(),
                    block_count,
                    format!(
                        "no free block left for {zone_count} zone(s) after existing zone subnets"
                    ),
                )
            })?;
        taken.push(block);
        assigned.push((idx, block));
    }

    // Nothing is written until every pending zone has a block.
    for (idx, block) in assigned {
        let zone = &mut spec.zones[idx];
        debug!(cluster = %cluster_name, zone = %zone.name, cidr = %block, "assigned zone subnet");
        zone.cidr = Some(block.to_string());
    }

    Ok(())
}
