//! # stride-events
//!
//! Message-bus event machinery for Stride.
//!
//! Commands mutate a goal, persist it, and hand the resulting event to an
//! [`EventPublisher`]. Publishing is fire-and-forget past serialization:
//! the payload is serialized synchronously (so a malformed event fails the
//! caller immediately), then enqueued for a background worker that drives
//! the actual broker send. Broker failures are logged, never retried, and
//! never surfaced back to the command path.
//!
//! ## Key components
//!
//! - [`BusEvent`] — trait fixing an event's topic and partition key
//! - [`EventTransport`] — the broker seam (swap in a real client here)
//! - [`JsonlTransport`] — append-only per-topic JSONL files with
//!   partition/offset receipts
//! - [`MemoryTransport`] — in-memory transport for tests and embedded use
//! - [`EventPublisher`] — async fire-and-forget publisher with
//!   drain-on-shutdown

pub mod error;
pub mod event;
pub mod publisher;
pub mod transport;

pub use error::EventError;
pub use event::{BusEvent, Envelope};
pub use publisher::{global, install, EventPublisher, DEFAULT_SEND_TIMEOUT};
pub use transport::{EventTransport, JsonlTransport, MemoryTransport, Receipt};
