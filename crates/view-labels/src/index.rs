//! Node label index.
//!
//! Holds the authoritative set of node records and the key catalogue derived
//! from them. The catalogue is rebuilt from scratch after every effective
//! mutation; label-key cardinality is small, so there is no diffing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::label::LabelKey;

/// Index shared between the watch task and the interaction loop.
pub type SharedIndex = Arc<Mutex<NodeLabelIndex>>;

/// A node name and its labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    /// Node name, unique within the cluster.
    pub name: String,
    /// Label key to value.
    pub labels: BTreeMap<String, String>,
}

impl NodeRecord {
    /// Create a record from a name and label pairs.
    #[must_use]
    pub fn new<K, V>(name: impl Into<String>, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Whether the node carries `key`.
    #[must_use]
    pub fn has_label(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }
}

/// Node records keyed by name, plus the sorted key catalogue.
#[derive(Debug, Default)]
pub struct NodeLabelIndex {
    nodes: BTreeMap<String, NodeRecord>,
    catalogue: Vec<LabelKey>,
    generation: u64,
    last_updated: Option<DateTime<Utc>>,
}

impl NodeLabelIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the index for sharing across tasks.
    #[must_use]
    pub fn shared(self) -> SharedIndex {
        Arc::new(Mutex::new(self))
    }

    /// Replace the whole node set, as after a full listing.
    pub fn seed(&mut self, nodes: impl IntoIterator<Item = NodeRecord>) {
        self.nodes = nodes
            .into_iter()
            .map(|node| (node.name.clone(), node))
            .collect();
        self.changed();
    }

    /// Insert a node, overwriting any record with the same name.
    pub fn apply_add(&mut self, node: NodeRecord) {
        debug!(node = %node.name, labels = node.labels.len(), "Node added");
        self.nodes.insert(node.name.clone(), node);
        self.changed();
    }

    /// Replace a known node. Returns `false` and leaves the index untouched if
    /// the name is unknown or the labels are unchanged.
    pub fn apply_update(&mut self, node: NodeRecord) -> bool {
        match self.nodes.get_mut(&node.name) {
            Some(existing) if existing.labels == node.labels => false,
            Some(existing) => {
                debug!(node = %node.name, labels = node.labels.len(), "Node updated");
                *existing = node;
                self.changed();
                true
            }
            None => {
                debug!(node = %node.name, "Ignoring update for unknown node");
                false
            }
        }
    }

    /// Remove a node. Returns `false` if it was not present.
    pub fn apply_delete(&mut self, name: &str) -> bool {
        if self.nodes.remove(name).is_some() {
            debug!(node = %name, "Node deleted");
            self.changed();
            true
        } else {
            debug!(node = %name, "Ignoring delete for unknown node");
            false
        }
    }

    /// Sorted, de-duplicated keys across all current nodes.
    #[must_use]
    pub fn recompute_key_catalogue(&self) -> Vec<LabelKey> {
        self.nodes
            .values()
            .flat_map(|node| node.labels.keys())
            .map(String::as_str)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(LabelKey::new)
            .collect()
    }

    /// The catalogue as of the last mutation.
    #[must_use]
    pub fn catalogue(&self) -> &[LabelKey] {
        &self.catalogue
    }

    /// Node records in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    /// Look up a node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NodeRecord> {
        self.nodes.get(name)
    }

    /// Whether a node with this name is indexed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counter bumped on every effective mutation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Time of the last effective mutation.
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    // Catalogue refresh happens before the caller releases the lock.
    fn changed(&mut self) {
        self.catalogue = self.recompute_key_catalogue();
        self.generation += 1;
        self.last_updated = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(keys: &[LabelKey]) -> Vec<&str> {
        keys.iter().map(LabelKey::name).collect()
    }

    fn sample_index() -> NodeLabelIndex {
        let mut index = NodeLabelIndex::new();
        index.apply_add(NodeRecord::new("A", [("env", "prod"), ("zone", "us")]));
        index.apply_add(NodeRecord::new("B", [("env", "dev")]));
        index
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = NodeLabelIndex::new();
        assert!(index.is_empty());
        assert!(index.catalogue().is_empty());
        assert_eq!(index.generation(), 0);
        assert!(index.last_updated().is_none());
    }

    #[test]
    fn test_catalogue_is_sorted_and_unique() {
        let index = sample_index();
        assert_eq!(names(index.catalogue()), vec!["env", "zone"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_delete_drops_keys_no_longer_observed() {
        let mut index = sample_index();
        assert!(index.apply_delete("A"));
        assert_eq!(names(index.catalogue()), vec!["env"]);
    }

    #[test]
    fn test_unlabelled_node_leaves_catalogue_unchanged() {
        let mut index = sample_index();
        index.apply_add(NodeRecord::new("C", Vec::<(String, String)>::new()));
        assert_eq!(names(index.catalogue()), vec!["env", "zone"]);
        assert!(index.contains("C"));
    }

    #[test]
    fn test_add_overwrites_existing_name() {
        let mut index = sample_index();
        index.apply_add(NodeRecord::new("A", [("arch", "arm64")]));
        assert_eq!(index.len(), 2);
        assert_eq!(names(index.catalogue()), vec!["arch", "env"]);
    }

    #[test]
    fn test_update_replaces_labels() {
        let mut index = sample_index();
        assert!(index.apply_update(NodeRecord::new("B", [("env", "staging"), ("gpu", "a100")])));
        assert_eq!(index.get("B").unwrap().labels["env"], "staging");
        assert_eq!(names(index.catalogue()), vec!["env", "gpu", "zone"]);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut index = sample_index();
        let generation = index.generation();
        assert!(!index.apply_update(NodeRecord::new("ghost", [("new", "key")])));
        assert_eq!(names(index.catalogue()), vec!["env", "zone"]);
        assert_eq!(index.generation(), generation);
        assert!(!index.contains("ghost"));
    }

    #[test]
    fn test_identical_update_is_noop() {
        let mut index = NodeLabelIndex::new();
        index.apply_add(NodeRecord::new("A", [("env", "prod")]));
        let generation = index.generation();
        let last_updated = index.last_updated();

        for _ in 0..1000 {
            assert!(!index.apply_update(NodeRecord::new("A", [("env", "prod")])));
        }
        assert_eq!(index.generation(), generation);
        assert_eq!(index.last_updated(), last_updated);

        assert!(index.apply_update(NodeRecord::new("A", [("env", "dev")])));
        assert_eq!(index.generation(), generation + 1);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut index = sample_index();
        let generation = index.generation();
        assert!(!index.apply_delete("ghost"));
        assert_eq!(names(index.catalogue()), vec!["env", "zone"]);
        assert_eq!(index.generation(), generation);
    }

    #[test]
    fn test_seed_replaces_node_set() {
        let mut index = sample_index();
        index.seed(vec![NodeRecord::new("X", [("region", "eu")])]);
        assert_eq!(index.len(), 1);
        assert!(!index.contains("A"));
        assert_eq!(names(index.catalogue()), vec!["region"]);
    }

    #[test]
    fn test_mutations_bump_generation() {
        let mut index = NodeLabelIndex::new();
        index.apply_add(NodeRecord::new("A", [("env", "prod")]));
        index.apply_update(NodeRecord::new("A", [("env", "dev")]));
        index.apply_delete("A");
        assert_eq!(index.generation(), 3);
        assert!(index.last_updated().is_some());
    }

    #[test]
    fn test_shared_index_locks() {
        let shared = NodeLabelIndex::new().shared();
        shared.lock().apply_add(NodeRecord::new("A", [("env", "prod")]));
        assert_eq!(shared.lock().len(), 1);
    }

    fn arb_nodes() -> impl Strategy<Value = Vec<NodeRecord>> {
        prop::collection::vec(
            (
                "[a-z]{1,4}",
                prop::collection::btree_map("[a-zA-Z./-]{1,6}", "[a-z0-9]{0,3}", 0..5),
            ),
            0..8,
        )
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, labels)| NodeRecord { name, labels })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn catalogue_independent_of_insertion_order(nodes in arb_nodes()) {
            // Duplicate names would make the last writer depend on order.
            let mut unique: BTreeMap<String, NodeRecord> = BTreeMap::new();
            for node in nodes {
                unique.entry(node.name.clone()).or_insert(node);
            }
            let forward: Vec<NodeRecord> = unique.values().cloned().collect();
            let backward: Vec<NodeRecord> = forward.iter().rev().cloned().collect();

            let mut a = NodeLabelIndex::new();
            for node in forward {
                a.apply_add(node);
            }
            let mut b = NodeLabelIndex::new();
            for node in backward {
                b.apply_add(node);
            }
            prop_assert_eq!(a.catalogue(), b.catalogue());
        }

        #[test]
        fn catalogue_sorted_without_duplicates(nodes in arb_nodes()) {
            let mut index = NodeLabelIndex::new();
            index.seed(nodes);
            let catalogue = index.catalogue();
            prop_assert!(catalogue.windows(2).all(|w| w[0].name() < w[1].name()));

            let expected: BTreeSet<&str> = index
                .nodes()
                .flat_map(|n| n.labels.keys().map(String::as_str))
                .collect();
            let actual: BTreeSet<&str> = catalogue.iter().map(LabelKey::name).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
