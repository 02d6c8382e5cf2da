use crate::data_model::{NotificationId, Origin};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed input, rejected before any round trip.
    #[error("invalid notification: {0}")]
    Validation(String),
    /// The caller lacks a capability, rejected before any round trip.
    #[error("permission denied: {0}")]
    Permission(String),
    /// The backend has no record with this id. Callers deleting a record treat this as success.
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn transport(context: &str, e: impl std::fmt::Debug) -> Self {
        Error::Transport(format!("{context}: {e:?}"))
    }
}

/// A channel could not be opened, or was rejected by the backend after opening.
/// Terminal for that channel. The session keeps running in degraded mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin} notification channel failed: {reason}")]
pub struct ChannelError {
    pub origin: Origin,
    pub reason: String,
}

/// Raised by a [`crate::adapter::Transport`] that cannot open a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);
