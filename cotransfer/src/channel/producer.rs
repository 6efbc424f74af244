//! Producer side of the transfer channel.
//!
//! The handle a producer body is given: it reads what the consumer sent and
//! hands control back with or without a payload.

use corosensei::Yielder;

use super::Handoff;
use crate::error::{Error, ErrorKind, Result};

/// Producer side of the transfer channel.
///
/// Only reachable from inside the body passed to [`Channel::new`], so the
/// producer's operations can never run while the consumer holds control.
///
/// [`Channel::new`]: super::Channel::new
pub struct Producer<'y, T> {
    /// Switches back to the consumer.
    yielder: &'y Yielder<Handoff<T>, Option<T>>,

    /// What the most recent transfer into the body carried.
    inbox: Handoff<T>,
}

impl<'y, T> Producer<'y, T> {
    pub(crate) fn new(yielder: &'y Yielder<Handoff<T>, Option<T>>, first: Handoff<T>) -> Self {
        Self {
            yielder,
            inbox: first,
        }
    }

    /// Returns the last value sent by the consumer without transferring control.
    ///
    /// Fails with `ProtocolViolation` if the last transfer carried no value
    /// (or it was already taken), and with `ChannelClosed` once the consumer
    /// has closed the channel.
    pub fn receive(&self) -> Result<&T> {
        match &self.inbox {
            Handoff::Value(value) => Ok(value),
            Handoff::Empty => Err(Error::new(ErrorKind::ProtocolViolation)),
            Handoff::Close => Err(Error::new(ErrorKind::ChannelClosed)),
        }
    }

    /// Moves the last value sent by the consumer out of the inbox.
    pub fn take(&mut self) -> Result<T> {
        match core::mem::replace(&mut self.inbox, Handoff::Empty) {
            Handoff::Value(value) => Ok(value),
            Handoff::Empty => Err(Error::new(ErrorKind::ProtocolViolation)),
            Handoff::Close => {
                self.inbox = Handoff::Close;
                Err(Error::new(ErrorKind::ChannelClosed))
            }
        }
    }

    /// Returns true if a value is waiting to be received.
    pub fn has_value(&self) -> bool {
        matches!(self.inbox, Handoff::Value(_))
    }

    /// Returns true once the consumer has asked the body to finish.
    pub fn is_closing(&self) -> bool {
        matches!(self.inbox, Handoff::Close)
    }

    /// Hands `value` to the consumer and suspends until the next transfer.
    pub fn yield_(&mut self, value: T) {
        self.inbox = self.yielder.suspend(Some(value));
    }

    /// Suspends without a payload until the next transfer.
    pub fn suspend(&mut self) {
        self.inbox = self.yielder.suspend(None);
    }

    /// Iterates over the values the consumer sends.
    ///
    /// Each step takes the pending value, suspending without a payload while
    /// none is pending. Ends when the consumer closes the channel.
    pub fn incoming(&mut self) -> Incoming<'_, 'y, T> {
        Incoming { producer: self }
    }
}

/// Iterator over consumer-sent values, see [`Producer::incoming`].
pub struct Incoming<'p, 'y, T> {
    producer: &'p mut Producer<'y, T>,
}

impl<T> Iterator for Incoming<'_, '_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            match core::mem::replace(&mut self.producer.inbox, Handoff::Empty) {
                Handoff::Value(value) => return Some(value),
                Handoff::Close => {
                    self.producer.inbox = Handoff::Close;
                    return None;
                }
                Handoff::Empty => self.producer.suspend(),
            }
        }
    }
}

impl<T> core::iter::FusedIterator for Incoming<'_, '_, T> {}
