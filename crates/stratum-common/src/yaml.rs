//! Cluster manifest loading using yaml-rust2
//!
//! Operators author clusters as YAML. Manifests are parsed with yaml-rust2,
//! converted to serde_json::Value, and then deserialized into typed resources.
//! Completed specs are rendered back out as JSON (a YAML subset).

use serde_json::{Map, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::crd::Cluster;
use crate::{Error, Result};

const CLUSTER_KIND: &str = "Cluster";

/// Parse a YAML string into a serde_json::Value.
///
/// For multi-document YAML, returns only the first document.
/// Returns `Value::Null` for empty input.
pub fn parse_yaml(input: &str) -> Result<Value> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::serialization(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Load an operator-authored Cluster manifest
pub fn load_cluster(input: &str) -> Result<Cluster> {
    let value = parse_yaml(input)?;
    if value.is_null() {
        return Err(Error::serialization_for_kind(
            CLUSTER_KIND,
            "manifest is empty",
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| Error::serialization_for_kind(CLUSTER_KIND, e.to_string()))
}

/// Render a Cluster as pretty-printed JSON for downstream consumers
pub fn render_cluster(cluster: &Cluster) -> Result<String> {
    serde_json::to_string_pretty(cluster)
        .map_err(|e| Error::serialization_for_kind(CLUSTER_KIND, e.to_string()))
}

/// Convert a yaml_rust2::Yaml value to serde_json::Value
///
/// Cluster manifests only use string keys, and no Cluster field is
/// floating point, so anything else is rejected here with the offending
/// value rather than as an opaque deserialization error later.
fn yaml_to_json(yaml: Yaml) -> Result<Value> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| match k {
                Yaml::String(key) => yaml_to_json(v).map(|v| (key, v)),
                other => Err(Error::serialization_for_kind(
                    CLUSTER_KIND,
                    format!("mapping keys must be strings, found {other:?}"),
                )),
            })
            .collect::<Result<Map<String, Value>>>()
            .map(Value::Object),
        Yaml::Real(r) => Err(Error::serialization_for_kind(
            CLUSTER_KIND,
            format!("unexpected floating point value {r}"),
        )),
        Yaml::Alias(_) => Err(Error::serialization("YAML aliases not supported")),
        Yaml::BadValue => Err(Error::serialization("bad YAML value")),
    }
}
