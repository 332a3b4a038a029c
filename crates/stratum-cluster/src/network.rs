//! IPv4 CIDR helpers shared by assignment, defaulting and validation

use ipnet::Ipv4Net;
use stratum_common::{Error, Result};

/// Parse a CIDR-valued field of a cluster spec.
///
/// Only canonical IPv4 networks are accepted: "172.20.1.5/24" is rejected
/// because the host bits make the intended block ambiguous.
pub fn parse_cidr(cluster: &str, field: &str, value: &str) -> Result<Ipv4Net> {
    let net: Ipv4Net = value.parse().map_err(|e: ipnet::AddrParseError| {
        Error::validation_for_field(
            cluster,
            field,
            format!("{field} {value:?} is not a valid IPv4 CIDR: {e}"),
        )
    })?;

    let canonical = net.trunc();
    if net != canonical {
        return Err(Error::validation_for_field(
            cluster,
            field,
            format!("{field} {value:?} has host bits set (did you mean {canonical}?)"),
        ));
    }
    Ok(net)
}

/// Whether two CIDR blocks share any address.
///
/// Aligned blocks are either nested or disjoint, so containment in either
/// direction is the whole test.
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(b) || b.contains(a)
}

/// Number of extra prefix bits needed to give each of `count` parts its own block
pub fn prefix_bits_for(count: usize) -> u32 {
    count.max(1).next_power_of_two().trailing_zeros()
}

/// Split `network` into `2^bits` equal blocks in address order.
///
/// Returns `None` when the resulting prefix would be longer than /32.
pub fn subdivide(network: Ipv4Net, bits: u32) -> Option<Vec<Ipv4Net>> {
    let prefix = u32::from(network.prefix_len()).checked_add(bits)?;
    let prefix = u8::try_from(prefix).ok()?;
    network.subnets(prefix).ok().map(Iterator::collect)
}
