//! List ⇄ map conversions for the two substructures whose tree shape differs
//! from the wire shape.
//!
//! - Kubernetes scaling resources: `[{namespace, resources: [..]}]` in the
//!   tree, a list of single-namespace maps `namespace -> resource_name ->
//!   resource` on the wire.
//! - Routing controls: `[{region, routing_control_arns: [..]}]` in the tree,
//!   `region -> [{routing_control_arn, state}]` on the wire.
//!
//! Tree to domain rejects repeated keys instead of letting the last entry
//! win. Domain to tree emits entries in ascending key order.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::error::{ExpandError, FieldPath};
use super::fields::{arn_list, required_str};
use crate::config::tree::{
    AssociatedAlarmTree, KubernetesScalingResourceTree, RegionAndRoutingControlsTree,
    ScalingResourcesTree,
};
use crate::model::{
    ArcRoutingControlState, KubernetesScalingResource, RoutingControlState, ScalingResourceSet,
};

// ============================================================================
// Keyed entries: list items whose key field becomes a map key
// ============================================================================

/// A tree list item that is a map entry on the domain side. The key lives
/// in one of the item's own fields and is not stored again on the domain
/// value.
pub trait KeyedEntry {
    /// Tree field holding the key, used in error paths.
    const KEY_FIELD: &'static str;

    fn entry_key(&self) -> Option<&str>;
}

impl KeyedEntry for ScalingResourcesTree {
    const KEY_FIELD: &'static str = "namespace";

    fn entry_key(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl KeyedEntry for KubernetesScalingResourceTree {
    const KEY_FIELD: &'static str = "resource_name";

    fn entry_key(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }
}

impl KeyedEntry for RegionAndRoutingControlsTree {
    const KEY_FIELD: &'static str = "region";

    fn entry_key(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl KeyedEntry for AssociatedAlarmTree {
    const KEY_FIELD: &'static str = "name";

    fn entry_key(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Convert keyed list items, keeping their order.
///
/// Fails with `MissingRequiredField` when an item has no key and with
/// `DuplicateKey` when a key repeats. `convert` receives each item and its
/// path.
pub fn keyed_entries<T, V, F>(
    entries: &[T],
    path: &FieldPath,
    mut convert: F,
) -> Result<Vec<(String, V)>, ExpandError>
where
    T: KeyedEntry,
    F: FnMut(&T, &FieldPath) -> Result<V, ExpandError>,
{
    let mut seen = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let entry_path = path.index(i);
        let key_path = entry_path.field(T::KEY_FIELD);
        let key = match entry.entry_key() {
            Some(k) if !k.is_empty() => k,
            _ => return Err(ExpandError::missing(key_path)),
        };
        if !seen.insert(key) {
            return Err(ExpandError::DuplicateKey {
                path: key_path,
                key: key.to_string(),
            });
        }
        out.push((key.to_string(), convert(entry, &entry_path)?));
    }

    Ok(out)
}

/// Map entries in ascending key order.
pub fn sorted_entries<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

// ============================================================================
// Kubernetes scaling resources
// ============================================================================

/// Tree list to the wire's list of single-namespace maps.
///
/// A namespace may appear only once across the whole list, and a resource
/// name only once within its namespace.
pub fn expand_scaling_resources(
    entries: &[ScalingResourcesTree],
    path: &FieldPath,
) -> Result<Vec<ScalingResourceSet>, ExpandError> {
    let namespaces = keyed_entries(entries, path, |entry, entry_path| {
        let resources = keyed_entries(
            &entry.resources,
            &entry_path.field("resources"),
            expand_scaling_resource,
        )?;
        Ok(resources.into_iter().collect::<HashMap<_, _>>())
    })?;

    Ok(namespaces
        .into_iter()
        .map(|(namespace, resources)| HashMap::from([(namespace, resources)]))
        .collect())
}

fn expand_scaling_resource(
    tree: &KubernetesScalingResourceTree,
    path: &FieldPath,
) -> Result<KubernetesScalingResource, ExpandError> {
    Ok(KubernetesScalingResource {
        name: required_str(&tree.name, &path.field("name"))?,
        namespace: required_str(&tree.namespace, &path.field("namespace"))?,
        hpa_name: tree.hpa_name.clone(),
    })
}

/// Wire list of maps back to the tree list, rebuilding `resource_name` from
/// the map keys. An element holding several namespaces becomes one tree
/// entry per namespace.
pub fn flatten_scaling_resources(sets: &[ScalingResourceSet]) -> Vec<ScalingResourcesTree> {
    sets.iter()
        .flat_map(sorted_entries)
        .map(|(namespace, resources)| ScalingResourcesTree {
            namespace: Some(namespace.clone()),
            resources: sorted_entries(resources)
                .into_iter()
                .map(|(resource_name, resource)| KubernetesScalingResourceTree {
                    resource_name: Some(resource_name.clone()),
                    name: Some(resource.name.clone()),
                    namespace: Some(resource.namespace.clone()),
                    hpa_name: resource.hpa_name.clone(),
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Routing controls
// ============================================================================

/// Tree list to the wire map. Every control is switched `On`; the tree has
/// no field for any other state.
pub fn expand_routing_controls(
    entries: &[RegionAndRoutingControlsTree],
    path: &FieldPath,
) -> Result<HashMap<String, Vec<ArcRoutingControlState>>, ExpandError> {
    let regions = keyed_entries(entries, path, |entry, entry_path| {
        let arns = arn_list(
            &entry.routing_control_arns,
            &entry_path.field("routing_control_arns"),
        )?;
        Ok(arns
            .into_iter()
            .map(|routing_control_arn| ArcRoutingControlState {
                routing_control_arn,
                state: RoutingControlState::On,
            })
            .collect::<Vec<_>>())
    })?;

    Ok(regions.into_iter().collect())
}

/// Wire map back to the tree list, regions ascending.
///
/// The per-control state is dropped. A control that is `Off` cannot be
/// represented and is logged.
pub fn flatten_routing_controls(
    controls: &HashMap<String, Vec<ArcRoutingControlState>>,
) -> Vec<RegionAndRoutingControlsTree> {
    sorted_entries(controls)
        .into_iter()
        .map(|(region, states)| {
            for state in states.iter().filter(|s| s.state != RoutingControlState::On) {
                warn!(
                    region = %region,
                    routing_control = %state.routing_control_arn,
                    "Routing control state {} is not representable in the config tree; it will be re-applied as On",
                    state.state
                );
            }
            RegionAndRoutingControlsTree {
                region: Some(region.clone()),
                routing_control_arns: states
                    .iter()
                    .map(|s| s.routing_control_arn.clone())
                    .collect(),
            }
        })
        .collect()
}
