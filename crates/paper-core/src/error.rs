//! Error types for the compositor API
//!
//! Only misuse of the API surfaces as an error. Rendering problems
//! (missing assets, empty update areas, unallocated surfaces) degrade to
//! "that element does not appear" and are logged instead.

use thiserror_no_std::Error;

use crate::config::ConfigError;
use crate::ui::NodeId;

/// Errors returned by tree and manager operations
#[derive(Debug, Error)]
pub enum UiError {
    /// The handle refers to a node that has been removed
    #[error("Stale node handle: {0:?}")]
    StaleNode(NodeId),

    /// Children can only be added to frames, icons and modals
    #[error("Node {0:?} cannot hold children")]
    NotAContainer(NodeId),

    /// The compositor configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(ConfigError),
}

impl From<ConfigError> for UiError {
    fn from(err: ConfigError) -> Self {
        UiError::Config(err)
    }
}
