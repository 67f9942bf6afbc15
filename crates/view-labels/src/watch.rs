//! Watch synchronizer.
//!
//! Seeds the [`NodeLabelIndex`](crate::index::NodeLabelIndex) from a full
//! listing, then applies watch events to it from a background task. Events
//! are passed straight through in arrival order; there is no resource-version
//! check, so an update racing a delete can briefly resurrect stale data until
//! the next event for that node.

use std::collections::HashSet;
use std::future::Future;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ViewResult;
use crate::events::AppEvent;
use crate::index::{NodeRecord, SharedIndex};

/// A change to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// A node appeared.
    Added(NodeRecord),
    /// A node's labels may have changed.
    Updated(NodeRecord),
    /// A node was removed.
    Deleted(String),
}

/// Where nodes come from.
pub trait NodeSource {
    /// Full listing of current nodes.
    fn list_nodes(&self) -> impl Future<Output = ViewResult<Vec<NodeRecord>>> + Send;

    /// Stream of changes. `known` holds the names already indexed, so the
    /// source can tell additions from updates.
    fn watch_nodes(&self, known: HashSet<String>) -> BoxStream<'static, ViewResult<NodeEvent>>;
}

/// Applies node events to a shared index.
#[derive(Debug, Clone)]
pub struct WatchSynchronizer {
    index: SharedIndex,
    notify: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl WatchSynchronizer {
    /// Create a synchronizer for `index`.
    pub fn new(index: SharedIndex) -> Self {
        Self {
            index,
            notify: None,
        }
    }

    /// Send [`AppEvent::IndexChanged`] to `tx` after each effective change.
    #[must_use]
    pub fn with_notifier(mut self, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.notify = Some(tx);
        self
    }

    /// Replace the index contents with a full listing from `source`.
    pub async fn seed<S: NodeSource>(&self, source: &S) -> ViewResult<usize> {
        let nodes = source.list_nodes().await?;
        let count = nodes.len();
        let generation = {
            let mut index = self.index.lock();
            index.seed(nodes);
            info!(
                nodes = count,
                keys = index.catalogue().len(),
                "Seeded node index"
            );
            index.generation()
        };
        self.notify(generation);
        Ok(count)
    }

    /// Apply one event. Returns whether the index changed.
    pub fn apply(&self, event: NodeEvent) -> bool {
        let (changed, generation) = {
            let mut index = self.index.lock();
            let changed = match event {
                NodeEvent::Added(node) => {
                    index.apply_add(node);
                    true
                }
                NodeEvent::Updated(node) => index.apply_update(node),
                NodeEvent::Deleted(name) => index.apply_delete(&name),
            };
            (changed, index.generation())
        };
        if changed {
            self.notify(generation);
        }
        changed
    }

    /// Seed from `source`, then spawn a task applying its watch stream until
    /// `cancel` fires or the stream ends.
    ///
    /// Returns only after the index is seeded. A failed listing is returned
    /// as an error and no task is spawned.
    pub async fn start<S: NodeSource>(
        self,
        source: &S,
        cancel: CancellationToken,
    ) -> ViewResult<JoinHandle<()>> {
        self.seed(source).await?;
        let known: HashSet<String> = self
            .index
            .lock()
            .nodes()
            .map(|node| node.name.clone())
            .collect();
        let stream = source.watch_nodes(known);
        Ok(tokio::spawn(self.run(stream, cancel)))
    }

    /// Apply events from `stream` until `cancel` fires or the stream ends.
    pub async fn run(
        self,
        mut stream: BoxStream<'static, ViewResult<NodeEvent>>,
        cancel: CancellationToken,
    ) {
        info!("Node watch started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Node watch cancelled");
                    break;
                }
                next = stream.next() => match next {
                    Some(Ok(event)) => {
                        debug!(?event, "Watch event");
                        self.apply(event);
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "Skipping failed watch event");
                    }
                    None => {
                        info!("Node watch stream ended");
                        break;
                    }
                }
            }
        }
    }

    fn notify(&self, generation: u64) {
        if let Some(tx) = &self.notify {
            if tx.send(AppEvent::IndexChanged(generation)).is_err() {
                debug!(generation, "Index change listener is gone");
            }
        }
    }
}
