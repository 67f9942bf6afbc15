//! Per-node projection of label values onto the filtered keys.

use std::collections::{BTreeMap, HashSet};

use crate::index::NodeRecord;
use crate::label::{LabelKey, LabelValue};

/// Node name to its values for the filtered keys, in filtered-key order.
///
/// Names iterate in sorted order.
pub type NodeInfos = BTreeMap<String, Vec<LabelValue>>;

/// Build the projection for `filtered_keys`.
///
/// A node appears only if it carries at least one of the keys; when it does,
/// it gets exactly one value per key, with [`LabelValue::missing`] standing in
/// for keys it lacks.
pub fn project<'a>(
    filtered_keys: &[LabelKey],
    nodes: impl IntoIterator<Item = &'a NodeRecord>,
) -> NodeInfos {
    let wanted: HashSet<&str> = filtered_keys.iter().map(LabelKey::name).collect();

    nodes
        .into_iter()
        .filter(|node| node.labels.keys().any(|key| wanted.contains(key.as_str())))
        .map(|node| {
            let values = filtered_keys
                .iter()
                .map(|key| match node.labels.get(key.name()) {
                    Some(value) => LabelValue::present(key.clone(), value.clone()),
                    None => LabelValue::missing(key.clone()),
                })
                .collect();
            (node.name.clone(), values)
        })
        .collect()
}

/// Length of the longest node name, for column alignment.
pub fn max_node_name_len(infos: &NodeInfos) -> usize {
    infos.keys().map(|name| name.chars().count()).max().unwrap_or(0)
}
