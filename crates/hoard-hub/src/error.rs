//! Error types for the hub.

/// Why a hub request could not be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The hub task has stopped or its queue is closed.
    #[error("hub is unavailable")]
    Unavailable,

    /// The hub is shutting down and no longer accepts changes.
    #[error("hub is shutting down")]
    ShuttingDown,
}
