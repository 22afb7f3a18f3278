// error.rs — Error types for the event bus machinery.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while publishing events to the bus.
#[derive(Debug, Error)]
pub enum EventError {
    /// The event payload could not be serialized to the wire format.
    /// Raised synchronously by `publish`, before anything is enqueued.
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The publisher has been shut down; no further events are accepted.
    #[error("event bus is closed")]
    BusClosed,

    /// A broker send did not complete within its deadline.
    /// Treated identically to a failed send: logged, not retried.
    #[error("send to topic {topic} timed out after {timeout:?}")]
    SendTimeout { topic: String, timeout: Duration },

    /// Transport-level file I/O failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
