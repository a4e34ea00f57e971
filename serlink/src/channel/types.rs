//! Shared channel types: identifiers, events, and the error taxonomy.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::port::provider::{ConfigError, OpenError};

/// Identifier for a channel owned by an event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Creates a new channel identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl From<u32> for ChannelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ChannelId> for u32 {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle events emitted by the event loop.
///
/// An event is enqueued strictly after the promise of the operation that
/// caused it has been resolved, so callers chaining off promise completion
/// never race callers draining events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel transitioned inactive → active and is now streaming.
    Active { channel: ChannelId },
    /// A previously active channel was closed.
    Inactive { channel: ChannelId },
}

/// Failure of a connect attempt, surfaced through the connect promise.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The device could not be resolved or opened.
    #[error(transparent)]
    Open(#[from] OpenError),
    /// The device rejected a configuration value during initialization.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The channel was closed before or during the attempt.
    #[error("channel is closed")]
    ClosedChannel,
    /// The channel already holds a device.
    #[error("channel is already connected")]
    AlreadyConnected,
}

/// Failure of a synchronous channel operation.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel is closed (or was discarded).
    #[error("channel is closed")]
    ClosedChannel,
    /// The channel is open but not yet streaming.
    #[error("channel is not active")]
    NotActive,
    /// The operation is not supported for this resource type.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_roundtrip() {
        let id = ChannelId::new(7);
        assert_eq!(u32::from(id), 7);
        assert_eq!(ChannelId::from(7u32), id);
        assert_eq!(format!("{id}"), "7");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", ChannelError::Unsupported("bind")),
            "unsupported operation: bind"
        );
        assert_eq!(format!("{}", ConnectError::ClosedChannel), "channel is closed");
    }
}
