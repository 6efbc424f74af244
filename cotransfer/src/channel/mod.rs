//! Consumer and producer sides of a transfer channel.
//!
//! The consumer owns a [`Channel`] and drives it; the producer body receives a
//! [`Producer`] handle for the duration of its execution.

mod consumer;
mod producer;

pub use consumer::{Channel, Sequence};
pub use producer::{Incoming, Producer};

/// Channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, producer body has not run yet.
    Created,

    /// Producer body is parked at a transfer point.
    Suspended,

    /// Producer body returned, or the channel was closed.
    Finished,
}

/// Which side currently holds control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The driver is running; the producer is suspended.
    ConsumerRunning,

    /// Control is inside the producer body.
    ProducerRunning,
}

/// Counters about transfers on a channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelStats {
    /// Transfers from the consumer into the producer body.
    pub transfers: u64,

    /// Transfers that carried a payload into the producer.
    pub values_sent: u64,

    /// Suspensions of the producer that carried a payload back.
    pub values_yielded: u64,
}

/// What a consumer-to-producer transfer carries.
#[derive(Debug)]
pub(crate) enum Handoff<T> {
    /// A payload passed by `send`.
    Value(T),

    /// A transfer without a payload, or a payload already taken.
    Empty,

    /// The consumer asked the body to finish.
    Close,
}
