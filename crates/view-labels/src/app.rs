//! Interaction loop state.
//!
//! Every input goes `Idle -> Recomputing -> Idle`: the filter and projection
//! are rebuilt synchronously under one index lock, then pagination is
//! resynchronized to the new key count. `Quit` moves to `Terminated`, which
//! ignores all further input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::filter::FuzzyFilter;
use crate::index::{NodeLabelIndex, SharedIndex};
use crate::label::LabelKey;
use crate::pagination::Paginator;
use crate::projection::{NodeInfos, project};

/// Characters that separate words inside a label key.
const WORD_DELIMITERS: &[char] = &['/', '.', '-', '_', ' '];

/// User input understood by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Append a character to the query.
    Char(char),
    /// Remove the last query character.
    Backspace,
    /// Remove the last word of the query.
    DeleteWord,
    /// Clear the query.
    ClearQuery,
    /// Show the next page of keys.
    NextPage,
    /// Show the previous page of keys.
    PrevPage,
    /// Show the first page of keys.
    FirstPage,
    /// Show the last page of keys.
    LastPage,
    /// Leave the loop.
    Quit,
}

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Showing the current view.
    Idle,
    /// Rebuilding the view.
    Recomputing,
    /// Quit was requested.
    Terminated,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewModel {
    /// Keys matching the query, in filter order.
    #[serde(rename = "keys")]
    pub filtered_keys: Vec<LabelKey>,
    /// Per-node values for `filtered_keys`.
    #[serde(rename = "nodes")]
    pub projection: NodeInfos,
    /// Nodes in the index.
    #[serde(skip)]
    pub node_count: usize,
    /// Keys in the full catalogue.
    #[serde(skip)]
    pub catalogue_len: usize,
    /// Index generation this view was built from.
    #[serde(skip)]
    pub generation: u64,
    /// Time of the last index change.
    #[serde(skip)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ViewModel {
    /// Derive the view for `query` from a locked index.
    pub fn build(index: &NodeLabelIndex, filter: &FuzzyFilter, query: &str) -> Self {
        let filtered_keys = filter.filter(query, index.catalogue());
        let projection = project(&filtered_keys, index.nodes());
        Self {
            filtered_keys,
            projection,
            node_count: index.len(),
            catalogue_len: index.catalogue().len(),
            generation: index.generation(),
            last_updated: index.last_updated(),
        }
    }
}

/// Interaction loop state
#[derive(Debug)]
pub struct App {
    state: LoopState,
    query: String,
    view: ViewModel,
    paginator: Paginator,
    filter: FuzzyFilter,
    index: SharedIndex,
}

impl App {
    /// Create the loop over `index` and build the initial view.
    pub fn new(index: SharedIndex, config: &ViewConfig) -> Self {
        let mut app = Self {
            state: LoopState::Idle,
            query: String::new(),
            view: ViewModel::default(),
            paginator: Paginator::new(config.page_size),
            filter: FuzzyFilter::new(config.filter_order),
            index,
        };
        app.recompute();
        app
    }

    /// Start with a pre-filled query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self.recompute();
        self
    }

    /// Apply one input.
    pub fn handle_input(&mut self, input: Input) {
        if self.state == LoopState::Terminated {
            return;
        }

        match input {
            Input::Quit => {
                info!("Quit requested");
                self.state = LoopState::Terminated;
                return;
            }
            Input::Char(c) => self.query.push(c),
            Input::Backspace => {
                self.query.pop();
            }
            Input::DeleteWord => delete_last_word(&mut self.query),
            Input::ClearQuery => self.query.clear(),
            Input::NextPage => self.paginator.next_page(),
            Input::PrevPage => self.paginator.prev_page(),
            Input::FirstPage => self.paginator.first_page(),
            Input::LastPage => self.paginator.last_page(),
        }

        self.recompute();
    }

    /// React to an index change notification. Stale notifications (already
    /// reflected in the view) are ignored.
    pub fn on_index_changed(&mut self, generation: u64) {
        if self.state == LoopState::Terminated || generation == self.view.generation {
            return;
        }
        self.recompute();
    }

    /// Rebuild the view from the current index contents.
    pub fn recompute(&mut self) {
        self.state = LoopState::Recomputing;
        {
            let index = self.index.lock();
            self.view = ViewModel::build(&index, &self.filter, &self.query);
        }
        self.paginator.set_total_items(self.view.filtered_keys.len());
        debug!(
            query = %self.query,
            keys = self.view.filtered_keys.len(),
            nodes = self.view.projection.len(),
            generation = self.view.generation,
            "View recomputed"
        );
        self.state = LoopState::Idle;
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the loop should keep running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state != LoopState::Terminated
    }

    /// The search query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Key list pagination.
    #[must_use]
    pub const fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Filtered keys on the current page.
    #[must_use]
    pub fn visible_keys(&self) -> &[LabelKey] {
        let (start, end) = self.paginator.slice_bounds(self.view.filtered_keys.len());
        &self.view.filtered_keys[start..end]
    }
}

fn delete_last_word(query: &mut String) {
    while query.ends_with(WORD_DELIMITERS) {
        query.pop();
    }
    while !query.is_empty() && !query.ends_with(WORD_DELIMITERS) {
        query.pop();
    }
}
