//! # view-labels
//!
//! Fuzzy search over the label keys of a cluster's nodes, with a live table
//! of each node's values for the keys that match.
//!
//! The engine is resource-agnostic and read-only:
//!
//! - [`index`]: node records and the sorted, de-duplicated key catalogue
//! - [`watch`]: seeds the index from a listing and applies watch events
//! - [`filter`]: case-sensitive subsequence matching over the catalogue
//! - [`projection`]: per-node values for the matching keys
//! - [`app`]: the interaction loop and its view-model
//!
//! [`cluster`] provides the Kubernetes node source; [`ui`] and [`events`]
//! are the terminal front end.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod cluster;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod index;
pub mod label;
pub mod pagination;
pub mod projection;
pub mod ui;
pub mod watch;

// Re-export main types
pub use app::{App, Input, LoopState, ViewModel};
pub use cluster::KubeNodeSource;
pub use config::ViewConfig;
pub use error::{ViewError, ViewResult};
pub use filter::{FilterOrder, FuzzyFilter};
pub use index::{NodeLabelIndex, NodeRecord, SharedIndex};
pub use label::{DisplayColor, LabelKey, LabelValue, NO_VALUE};
pub use projection::{NodeInfos, project};
pub use watch::{NodeEvent, NodeSource, WatchSynchronizer};
