// event.rs — BusEvent trait and the serialized wire envelope.
//
// An event type fixes two things about itself: the topic it is published
// to, and the partition key that orders it relative to other events. The
// publisher turns a BusEvent into an Envelope (topic + key + serialized
// payload) before handing it to the transport.

use serde::Serialize;

/// A typed event that can be published to the bus.
///
/// Events sharing a partition key are observed in emission order by any
/// single consumer of that partition. There is no ordering guarantee
/// across different keys, and none is promised.
pub trait BusEvent: Serialize {
    /// The topic this event is published to (e.g. "goal.created").
    fn topic(&self) -> &'static str;

    /// The partition/ordering key for this event.
    fn partition_key(&self) -> String;
}

/// A serialized event ready for the broker.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub topic: &'static str,
    pub partition_key: String,
    /// The event payload as canonical wire JSON.
    pub payload: String,
}
