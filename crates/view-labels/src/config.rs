//! Viewer configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ViewError, ViewResult};
use crate::filter::FilterOrder;

/// Configuration for the label viewer.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Number of label keys shown per page.
    pub page_size: usize,
    /// Width of the label key column; longer names are truncated.
    pub key_width: usize,
    /// Maximum number of node rows rendered before eliding with `...`.
    pub max_rows: usize,
    /// Terminal poll interval.
    pub tick_rate: Duration,
    /// Ordering of matched keys.
    pub filter_order: FilterOrder,
    /// Explicit kubeconfig path. `None` uses the client's default inference.
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context override.
    pub context: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            key_width: 40,
            max_rows: 16,
            tick_rate: Duration::from_millis(100),
            filter_order: FilterOrder::Catalogue,
            kubeconfig: None,
            context: None,
        }
    }
}

impl ViewConfig {
    /// Smallest key width that still leaves room for the `...` suffix.
    pub const MIN_KEY_WIDTH: usize = 4;

    /// Widest key column the terminal layout accepts.
    pub const MAX_KEY_WIDTH: usize = 1024;

    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of keys per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the key column width.
    #[must_use]
    pub const fn with_key_width(mut self, width: usize) -> Self {
        self.key_width = width;
        self
    }

    /// Set the maximum number of node rows.
    #[must_use]
    pub const fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }

    /// Set the terminal poll interval.
    #[must_use]
    pub const fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the ordering of matched keys.
    #[must_use]
    pub const fn with_filter_order(mut self, order: FilterOrder) -> Self {
        self.filter_order = order;
        self
    }

    /// Use an explicit kubeconfig file.
    #[must_use]
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Use a specific kubeconfig context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ViewResult<()> {
        if self.page_size == 0 {
            return Err(ViewError::InvalidConfig(
                "page size must be at least 1".to_string(),
            ));
        }
        if self.key_width < Self::MIN_KEY_WIDTH {
            return Err(ViewError::InvalidConfig(format!(
                "key width must be at least {}, got {}",
                Self::MIN_KEY_WIDTH,
                self.key_width
            )));
        }
        if self.key_width > Self::MAX_KEY_WIDTH {
            return Err(ViewError::InvalidConfig(format!(
                "key width must be at most {}, got {}",
                Self::MAX_KEY_WIDTH,
                self.key_width
            )));
        }
        if self.tick_rate.is_zero() {
            return Err(ViewError::InvalidConfig(
                "tick rate must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
