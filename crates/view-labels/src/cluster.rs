//! Kubernetes node source.
//!
//! Lists and watches `Node` objects through `kube`. The watcher reports
//! `Apply` for both creations and modifications, and relists from scratch
//! after a desync; [`EventClassifier`] turns that into add/update/delete
//! events against the set of names it has already seen.

use std::collections::HashSet;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::runtime::WatchStreamExt;
use kube::runtime::watcher::{self, Event};
use kube::{Client, Config};
use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::error::{ViewError, ViewResult};
use crate::index::NodeRecord;
use crate::watch::{NodeEvent, NodeSource};

/// Convert a `Node` into a record. Nodes without a name are skipped.
pub fn node_record(node: &Node) -> Option<NodeRecord> {
    let name = node.metadata.name.clone()?;
    let labels = node.metadata.labels.clone().unwrap_or_default();
    Some(NodeRecord { name, labels })
}

/// Node source backed by the cluster API.
#[derive(Clone)]
pub struct KubeNodeSource {
    api: Api<Node>,
}

impl KubeNodeSource {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    /// Build a client from the configured kubeconfig and context, or from
    /// the environment when neither is set.
    pub async fn connect(config: &ViewConfig) -> ViewResult<Self> {
        let client = if config.kubeconfig.is_none() && config.context.is_none() {
            Client::try_default()
                .await
                .map_err(|err| ViewError::Client(err.to_string()))?
        } else {
            let options = KubeConfigOptions {
                context: config.context.clone(),
                ..Default::default()
            };
            let kube_config = match &config.kubeconfig {
                Some(path) => {
                    let kubeconfig = Kubeconfig::read_from(path)?;
                    Config::from_custom_kubeconfig(kubeconfig, &options).await?
                }
                None => Config::from_kubeconfig(&options).await?,
            };
            info!(cluster_url = %kube_config.cluster_url, "Using kubeconfig");
            Client::try_from(kube_config).map_err(|err| ViewError::Client(err.to_string()))?
        };
        Ok(Self::new(client))
    }
}

impl NodeSource for KubeNodeSource {
    async fn list_nodes(&self) -> ViewResult<Vec<NodeRecord>> {
        let list = self
            .api
            .list(&ListParams::default())
            .await
            .map_err(|source| ViewError::List {
                resource: "nodes",
                source,
            })?;
        debug!(nodes = list.items.len(), "Listed nodes");
        Ok(list.items.iter().filter_map(node_record).collect())
    }

    fn watch_nodes(&self, known: HashSet<String>) -> BoxStream<'static, ViewResult<NodeEvent>> {
        let mut classifier = EventClassifier::new(known);
        node_watch_stream(self.api.clone())
            .map(move |event| match event {
                Ok(event) => classifier.classify(event).into_iter().map(Ok).collect(),
                Err(err) => vec![Err(ViewError::from(err))],
            })
            .flat_map(stream::iter)
            .boxed()
    }
}

fn node_watch_stream(
    api: Api<Node>,
) -> impl futures::Stream<Item = Result<Event<Node>, watcher::Error>> + Send {
    watcher::watcher(api, watcher::Config::default()).default_backoff()
}

/// Tracks known node names to classify watcher events.
#[derive(Debug, Default)]
pub struct EventClassifier {
    known: HashSet<String>,
    relisted: Option<HashSet<String>>,
}

impl EventClassifier {
    /// Start from the names already in the index.
    pub fn new(known: HashSet<String>) -> Self {
        Self {
            known,
            relisted: None,
        }
    }

    /// Translate one watcher event into zero or more node events.
    pub fn classify(&mut self, event: Event<Node>) -> Vec<NodeEvent> {
        match event {
            Event::Apply(node) => self.applied(&node).into_iter().collect(),
            Event::Delete(node) => match node.metadata.name {
                Some(name) => {
                    self.known.remove(&name);
                    vec![NodeEvent::Deleted(name)]
                }
                None => Vec::new(),
            },
            Event::Init => {
                debug!("Watcher relist started");
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            Event::InitApply(node) => {
                if let (Some(seen), Some(name)) = (&mut self.relisted, &node.metadata.name) {
                    seen.insert(name.clone());
                }
                self.applied(&node).into_iter().collect()
            }
            Event::InitDone => {
                let Some(seen) = self.relisted.take() else {
                    return Vec::new();
                };
                let mut gone: Vec<String> = self.known.difference(&seen).cloned().collect();
                gone.sort();
                for name in &gone {
                    self.known.remove(name);
                }
                debug!(removed = gone.len(), "Watcher relist finished");
                gone.into_iter().map(NodeEvent::Deleted).collect()
            }
        }
    }

    fn applied(&mut self, node: &Node) -> Option<NodeEvent> {
        let record = node_record(node)?;
        if self.known.insert(record.name.clone()) {
            Some(NodeEvent::Added(record))
        } else {
            Some(NodeEvent::Updated(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn node(name: &str, labels: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_node_record_copies_labels() {
        let record = node_record(&node("A", &[("env", "prod")])).unwrap();
        assert_eq!(record.name, "A");
        assert_eq!(record.labels["env"], "prod");
    }

    #[test]
    fn test_node_record_without_labels() {
        let mut n = node("A", &[]);
        n.metadata.labels = None;
        let record = node_record(&n).unwrap();
        assert!(record.labels.is_empty());
    }

    #[test]
    fn test_unnamed_node_is_skipped() {
        let mut n = node("A", &[("env", "prod")]);
        n.metadata.name = None;
        assert!(node_record(&n).is_none());

        let mut classifier = EventClassifier::default();
        assert!(classifier.classify(Event::Apply(n)).is_empty());
    }

    #[test]
    fn test_apply_distinguishes_add_from_update() {
        let mut classifier = EventClassifier::new(known(&["A"]));

        let events = classifier.classify(Event::Apply(node("A", &[("env", "dev")])));
        assert!(matches!(events.as_slice(), [NodeEvent::Updated(r)] if r.name == "A"));

        let events = classifier.classify(Event::Apply(node("B", &[])));
        assert!(matches!(events.as_slice(), [NodeEvent::Added(r)] if r.name == "B"));

        let events = classifier.classify(Event::Apply(node("B", &[("env", "prod")])));
        assert!(matches!(events.as_slice(), [NodeEvent::Updated(_)]));
    }

    #[test]
    fn test_delete_forgets_name() {
        let mut classifier = EventClassifier::new(known(&["A"]));

        let events = classifier.classify(Event::Delete(node("A", &[])));
        assert_eq!(events, vec![NodeEvent::Deleted("A".to_string())]);

        let events = classifier.classify(Event::Apply(node("A", &[])));
        assert!(matches!(events.as_slice(), [NodeEvent::Added(_)]));
    }

    #[test]
    fn test_relist_deletes_vanished_nodes() {
        let mut classifier = EventClassifier::new(known(&["A", "B", "C"]));

        assert!(classifier.classify(Event::Init).is_empty());
        let events = classifier.classify(Event::InitApply(node("B", &[("env", "prod")])));
        assert!(matches!(events.as_slice(), [NodeEvent::Updated(r)] if r.name == "B"));
        let events = classifier.classify(Event::InitApply(node("D", &[])));
        assert!(matches!(events.as_slice(), [NodeEvent::Added(r)] if r.name == "D"));

        let events = classifier.classify(Event::InitDone);
        assert_eq!(
            events,
            vec![
                NodeEvent::Deleted("A".to_string()),
                NodeEvent::Deleted("C".to_string()),
            ]
        );

        // Nothing pending after the relist closes.
        assert!(classifier.classify(Event::InitDone).is_empty());
    }
}
