//! Etcd topology
//!
//! Every etcd cluster role gets exactly one member per availability zone.
//! Members are named after their zone and sorted by zone name, so the same
//! zone set always yields byte-identical topology regardless of the order
//! zones were listed in.

use std::collections::BTreeSet;

use stratum_common::crd::{ClusterSpec, EtcdClusterSpec, EtcdMemberSpec};
use stratum_common::{Error, Result, UNKNOWN_CONTEXT};

/// Build one etcd cluster per role, each with a member in every zone
pub fn build_etcd_clusters<S: AsRef<str>>(
    spec: &ClusterSpec,
    roles: &[S],
) -> Vec<EtcdClusterSpec> {
    let zone_names = spec.zone_names();

    roles
        .iter()
        .map(|role| EtcdClusterSpec {
            name: role.as_ref().to_string(),
            members: zone_names
                .iter()
                .map(|zone| EtcdMemberSpec::for_zone(*zone))
                .collect(),
        })
        .collect()
}

/// Check that the spec's etcd topology matches its zone set exactly.
///
/// The topology is never repaired: any divergence is reported so the
/// operator can fix whatever produced it.
pub fn check_etcd_topology(cluster: &str, spec: &ClusterSpec) -> Result<()> {
    if spec.etcd_clusters.is_empty() {
        return Err(Error::topology_inconsistency(
            cluster,
            UNKNOWN_CONTEXT,
            "no etcd clusters defined",
        ));
    }

    let zone_names = spec.zone_names();
    let mut seen_clusters = BTreeSet::new();

    for etcd in &spec.etcd_clusters {
        if etcd.name.is_empty() {
            return Err(Error::topology_inconsistency(
                cluster,
                UNKNOWN_CONTEXT,
                "etcd cluster has no name",
            ));
        }
        if !seen_clusters.insert(etcd.name.as_str()) {
            return Err(Error::topology_inconsistency(
                cluster,
                &etcd.name,
                "etcd cluster defined more than once",
            ));
        }
        check_members(cluster, etcd, &zone_names)?;
    }

    Ok(())
}

fn check_members(
    cluster: &str,
    etcd: &EtcdClusterSpec,
    zone_names: &BTreeSet<&str>,
) -> Result<()> {
    if etcd.members.is_empty() {
        return Err(Error::topology_inconsistency(
            cluster,
            &etcd.name,
            "etcd cluster has no members",
        ));
    }

    let mut member_zones: BTreeSet<&str> = BTreeSet::new();
    for member in &etcd.members {
        if member.name != member.zone {
            return Err(Error::topology_inconsistency(
                cluster,
                &etcd.name,
                format!(
                    "member {:?} must be named after its zone {:?}",
                    member.name, member.zone
                ),
            ));
        }
        if !zone_names.contains(member.zone.as_str()) {
            return Err(Error::topology_inconsistency(
                cluster,
                &etcd.name,
                format!("member placed in unknown zone {:?}", member.zone),
            ));
        }
        if !member_zones.insert(member.zone.as_str()) {
            return Err(Error::topology_inconsistency(
                cluster,
                &etcd.name,
                format!("more than one member in zone {:?}", member.zone),
            ));
        }
    }

    if let Some(missing) = zone_names.iter().find(|z| !member_zones.contains(*z)) {
        return Err(Error::topology_inconsistency(
            cluster,
            &etcd.name,
            format!("missing member for zone {missing:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_common::crd::ZoneSpec;
    use stratum_common::ETCD_CLUSTER_ROLES;

    fn spec_with_zones(names: &[&str]) -> ClusterSpec {
        ClusterSpec {
            zones: names.iter().map(|n| ZoneSpec::new(*n)).collect(),
            ..Default::default()
        }
    }

    fn member_zones(etcd: &EtcdClusterSpec) -> Vec<&str> {
        etcd.members.iter().map(|m| m.zone.as_str()).collect()
    }

    // =========================================================================
    // Topology Construction Stories
    // =========================================================================

    /// Story: Three zones give every etcd role three members
    #[test]
    fn story_one_member_per_zone_for_each_role() {
        let spec = spec_with_zones(&["us-east-1a", "us-east-1b", "us-east-1c"]);

        let clusters = build_etcd_clusters(&spec, ETCD_CLUSTER_ROLES);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].name, "main");
        assert_eq!(clusters[1].name, "events");
        for etcd in &clusters {
            assert_eq!(etcd.members.len(), 3);
            for member in &etcd.members {
                assert_eq!(member.name, member.zone);
            }
            assert_eq!(
                member_zones(etcd),
                vec!["us-east-1a", "us-east-1b", "us-east-1c"]
            );
        }
    }

    /// Story: Zone listing order does not change the topology
    ///
    /// Downstream resources are named after members, so reordering zones in
    /// the manifest must not rename anything.
    #[test]
    fn story_member_order_is_independent_of_zone_order() {
        let forward = build_etcd_clusters(&spec_with_zones(&["b", "c", "a"]), &["main"]);
        let reverse = build_etcd_clusters(&spec_with_zones(&["a", "c", "b"]), &["main"]);

        assert_eq!(forward, reverse);
        assert_eq!(member_zones(&forward[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_zone_names_collapse_to_one_member() {
        let clusters = build_etcd_clusters(&spec_with_zones(&["a", "a", "b"]), &["main"]);
        assert_eq!(member_zones(&clusters[0]), vec!["a", "b"]);
    }

    #[test]
    fn built_topology_passes_its_own_check() {
        let mut spec = spec_with_zones(&["us-east-1c", "us-east-1a"]);
        spec.etcd_clusters = build_etcd_clusters(&spec, ETCD_CLUSTER_ROLES);
        assert!(check_etcd_topology("c", &spec).is_ok());
    }

    // =========================================================================
    // Consistency Check Stories
    // =========================================================================

    #[test]
    fn unsorted_but_complete_topology_passes() {
        let mut spec = spec_with_zones(&["a", "b", "c"]);
        spec.etcd_clusters = vec![
            etcd("events", &["c", "a", "b"]),
            etcd("main", &["b", "c", "a"]),
        ];
        assert!(check_etcd_topology("c", &spec).is_ok());
    }

    fn expect_inconsistency(zone_list: &[&str], etcd: Vec<EtcdClusterSpec>, needle: &str) {
        let mut spec = spec_with_zones(zone_list);
        spec.etcd_clusters = etcd;
        let err = check_etcd_topology("prod", &spec).expect_err("topology should be rejected");
        match &err {
            Error::TopologyInconsistency { cluster, .. } => assert_eq!(cluster, "prod"),
            other => panic!("Expected TopologyInconsistency, got {other:?}"),
        }
        assert!(
            err.to_string().contains(needle),
            "expected {needle:?} in {err}"
        );
    }

    fn etcd(name: &str, members: &[&str]) -> EtcdClusterSpec {
        EtcdClusterSpec {
            name: name.to_string(),
            members: members.iter().map(|z| EtcdMemberSpec::for_zone(*z)).collect(),
        }
    }

    /// Story: A supplied topology missing a zone is reported, not patched
    #[test]
    fn story_missing_zone_is_reported() {
        expect_inconsistency(&["a", "b", "c"], vec![etcd("main", &["a", "b"])], "\"c\"");
    }

    #[test]
    fn unknown_zone_is_reported() {
        expect_inconsistency(&["a"], vec![etcd("main", &["a", "z"])], "unknown zone");
    }

    #[test]
    fn duplicate_member_zone_is_reported() {
        expect_inconsistency(&["a", "b"], vec![etcd("main", &["a", "a", "b"])], "more than one");
    }

    #[test]
    fn misnamed_member_is_reported() {
        let mut main = etcd("main", &["a"]);
        main.members[0].name = "etcd-a".to_string();
        expect_inconsistency(&["a"], vec![main], "named after its zone");
    }

    #[test]
    fn duplicate_etcd_cluster_is_reported() {
        expect_inconsistency(
            &["a"],
            vec![etcd("main", &["a"]), etcd("main", &["a"])],
            "more than once",
        );
    }

    #[test]
    fn memberless_etcd_cluster_is_reported() {
        expect_inconsistency(&["a"], vec![etcd("events", &[])], "no members");
    }

    #[test]
    fn empty_topology_is_reported() {
        expect_inconsistency(&["a"], vec![], "no etcd clusters");
    }
}
