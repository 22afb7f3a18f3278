// publisher.rs — Asynchronous fire-and-forget event publisher.
//
// `publish` serializes the event synchronously, enqueues the envelope, and
// returns — the caller never waits on the broker. A background worker
// drains the queue one envelope at a time (preserving per-key emission
// order) and drives each send under a timeout. Send failures and timeouts
// are logged and dropped; the mutation that produced the event has already
// been persisted and is never rolled back.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::EventError;
use crate::event::{BusEvent, Envelope};
use crate::transport::EventTransport;

/// Default deadline for a single broker send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

struct PublisherInner {
    /// Taken (set to None) on shutdown; publish fails BusClosed afterwards.
    tx: Mutex<Option<UnboundedSender<Envelope>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the event emission pipeline. Cheap to clone; all clones share
/// one queue and one worker.
#[derive(Clone)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

impl EventPublisher {
    /// Spawn a publisher over the given transport with the default send
    /// timeout. Must be called from within a tokio runtime.
    pub fn new(transport: Arc<dyn EventTransport>) -> Self {
        Self::with_timeout(transport, DEFAULT_SEND_TIMEOUT)
    }

    /// Spawn a publisher with an explicit per-send timeout.
    pub fn with_timeout(transport: Arc<dyn EventTransport>, send_timeout: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let worker = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let send = transport.send(envelope.topic, &envelope.partition_key, &envelope.payload);
                match tokio::time::timeout(send_timeout, send).await {
                    Ok(Ok(receipt)) => {
                        tracing::debug!(
                            topic = envelope.topic,
                            key = %envelope.partition_key,
                            partition = receipt.partition,
                            offset = receipt.offset,
                            "event delivered"
                        );
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            topic = envelope.topic,
                            key = %envelope.partition_key,
                            error = %e,
                            "event send failed; not retried"
                        );
                    }
                    Err(_) => {
                        let e = EventError::SendTimeout {
                            topic: envelope.topic.to_string(),
                            timeout: send_timeout,
                        };
                        tracing::warn!(
                            topic = envelope.topic,
                            key = %envelope.partition_key,
                            error = %e,
                            "event send timed out; not retried"
                        );
                    }
                }
            }
        });

        Self {
            inner: Arc::new(PublisherInner {
                tx: Mutex::new(Some(tx)),
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// Serialize an event and enqueue it for delivery.
    ///
    /// Returns before the broker send happens. Serialization failures are
    /// the only synchronous error; everything past the queue is logged by
    /// the worker and never reaches the caller.
    pub fn publish<E: BusEvent>(&self, event: &E) -> Result<(), EventError> {
        let payload = serde_json::to_string(event)?;
        let envelope = Envelope {
            topic: event.topic(),
            partition_key: event.partition_key(),
            payload,
        };

        let tx = self.inner.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => tx.send(envelope).map_err(|_| EventError::BusClosed),
            None => Err(EventError::BusClosed),
        }
    }

    /// Close the queue and wait for the worker to drain in-flight sends.
    ///
    /// Call once before process exit. Subsequent `publish` calls fail with
    /// `BusClosed`; repeated shutdowns are no-ops.
    pub async fn shutdown(&self) {
        let tx = self
            .inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(tx);

        let worker = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "publisher worker did not shut down cleanly");
            }
        }
    }
}

static GLOBAL: OnceLock<EventPublisher> = OnceLock::new();

/// Install the process-wide publisher. Returns false if one was already
/// installed (the original stays in place).
pub fn install(publisher: EventPublisher) -> bool {
    GLOBAL.set(publisher).is_ok()
}

/// The process-wide publisher, if one has been installed.
pub fn global() -> Option<&'static EventPublisher> {
    GLOBAL.get()
}
