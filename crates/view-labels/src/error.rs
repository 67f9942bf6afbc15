//! Error types for view-labels.

use thiserror::Error;

/// Result type alias for view-labels operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// Errors that can occur while connecting to the cluster or driving the terminal.
///
/// The pure derivations (catalogue, filter, projection) never fail; every
/// variant here comes from cluster access, the terminal, or configuration.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The kubeconfig could not be read or resolved.
    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// The cluster client could not be built.
    #[error("failed to create cluster client: {0}")]
    Client(String),

    /// The initial node listing failed.
    #[error("failed to list {resource}: {source}")]
    List {
        /// Resource kind being listed.
        resource: &'static str,
        /// Underlying client error.
        #[source]
        source: kube::Error,
    },

    /// The watch stream reported an error.
    #[error("watch error: {0}")]
    Watch(String),

    /// Terminal setup, draw or teardown failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<kube::config::KubeconfigError> for ViewError {
    fn from(err: kube::config::KubeconfigError) -> Self {
        Self::Kubeconfig(err.to_string())
    }
}

impl From<kube::runtime::watcher::Error> for ViewError {
    fn from(err: kube::runtime::watcher::Error) -> Self {
        Self::Watch(err.to_string())
    }
}
