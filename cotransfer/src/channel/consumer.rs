//! Consumer side of the transfer channel.
//!
//! Owns the coroutine running the producer body and drives it one transfer
//! at a time.

use core::fmt;
use core::iter::FusedIterator;

use corosensei::stack::DefaultStack;
use corosensei::{Coroutine, CoroutineResult, Yielder};
use log::{debug, trace};

use super::{ChannelState, ChannelStats, Direction, Handoff, Producer};
use crate::config::ChannelConfig;
use crate::error::{Error, ErrorKind, Result};

/// Coroutine running a producer body: resumed with a handoff, suspends with
/// an optional payload.
type Body<T> = Coroutine<Handoff<T>, Option<T>, ()>;

/// Consumer side of the transfer channel.
///
/// Created with a producer body that has not run yet. Each [`send`] or
/// [`resume`] switches into the body and returns once the body yields,
/// suspends or returns. The value it yielded is then available through
/// [`current`].
///
/// # Example
///
/// ```rust
/// use cotransfer::{Channel, Producer};
///
/// let mut echo = Channel::new(|producer: &mut Producer<'_, String>| {
///     while let Ok(word) = producer.take() {
///         producer.yield_(word.to_uppercase());
///     }
/// });
///
/// echo.send("hello".to_string())?;
/// assert_eq!(echo.current().map(String::as_str), Some("HELLO"));
/// # Ok::<(), cotransfer::Error>(())
/// ```
///
/// [`send`]: Channel::send
/// [`resume`]: Channel::resume
/// [`current`]: Channel::current
pub struct Channel<T: 'static> {
    /// Coroutine running the producer body, released once it finishes.
    coroutine: Option<Body<T>>,

    /// Channel state.
    state: ChannelState,

    /// Side currently holding control.
    direction: Direction,

    /// Value most recently yielded by the producer.
    current: Option<T>,

    /// Transfer statistics.
    stats: ChannelStats,

    /// Label for log lines.
    name: Option<String>,
}

impl<T: 'static> Channel<T> {
    /// Creates a channel bound to `body`, using corosensei's default stack
    /// (the same size as [`DEFAULT_STACK_SIZE`]).
    ///
    /// # Panics
    ///
    /// Panics if the stack cannot be allocated. Use [`Channel::with_config`]
    /// to get a `StackAllocation` error instead.
    ///
    /// [`DEFAULT_STACK_SIZE`]: crate::DEFAULT_STACK_SIZE
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(&mut Producer<'_, T>) + 'static,
    {
        let coroutine: Body<T> =
            Coroutine::new(move |yielder, first| run_body(yielder, first, body));
        Self::from_coroutine(coroutine, None)
    }

    /// Creates a channel bound to `body` with the given configuration.
    pub fn with_config<F>(config: ChannelConfig, body: F) -> Result<Self>
    where
        F: FnOnce(&mut Producer<'_, T>) + 'static,
    {
        let stack = DefaultStack::new(config.stack_size)
            .map_err(|_| Error::new(ErrorKind::StackAllocation))?;
        let coroutine: Body<T> =
            Coroutine::with_stack(stack, move |yielder, first| run_body(yielder, first, body));
        Ok(Self::from_coroutine(coroutine, config.name))
    }

    fn from_coroutine(coroutine: Body<T>, name: Option<String>) -> Self {
        Self {
            coroutine: Some(coroutine),
            state: ChannelState::Created,
            direction: Direction::ConsumerRunning,
            current: None,
            stats: ChannelStats::default(),
            name,
        }
    }

    /// Returns true until the producer body has finished.
    pub fn is_open(&self) -> bool {
        self.state != ChannelState::Finished
    }

    /// Returns the current channel state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Returns which side holds control.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns transfer statistics.
    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Returns the configured channel name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the value most recently yielded by the producer.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Moves the value most recently yielded by the producer out.
    pub fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    /// Passes `value` to the producer body and runs it until it next
    /// suspends or returns.
    ///
    /// Fails with `ChannelClosed` once the body has finished.
    pub fn send(&mut self, value: T) -> Result<()> {
        self.transfer(Handoff::Value(value))
    }

    /// Runs the producer body until it next suspends or returns, without
    /// passing it a value.
    pub fn resume(&mut self) -> Result<()> {
        self.transfer(Handoff::Empty)
    }

    /// Asks the producer body to finish.
    ///
    /// Fails with `ProtocolViolation` if a panic escaped the body, in the
    /// same way as [`send`](Channel::send).
    ///
    /// A body that returns after seeing the close completes normally. A body
    /// that suspends again is unwound. A body that never started is dropped
    /// without running. Closing a finished channel does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.direction == Direction::ProducerRunning {
            return Err(Error::new(ErrorKind::ProtocolViolation));
        }
        match self.state {
            ChannelState::Finished => return Ok(()),
            ChannelState::Created => {
                debug!("[{}] Closed before the producer started", label(self.name.as_deref()));
                self.finish();
                return Ok(());
            }
            ChannelState::Suspended => {}
        }

        self.transfer(Handoff::Close)?;

        if self.state != ChannelState::Finished {
            debug!("[{}] Producer suspended after close, unwinding", label(self.name.as_deref()));
            self.finish();
        }
        Ok(())
    }

    /// Returns an iterator over the values the producer yields.
    ///
    /// A yielded value not yet taken with [`take_current`] comes first. After
    /// that, each step resumes the body; suspensions without a payload are
    /// skipped. Single pass: the iterator advances this channel's producer
    /// and ends when it finishes.
    ///
    /// [`take_current`]: Channel::take_current
    pub fn sequence(&mut self) -> Sequence<'_, T> {
        Sequence { channel: self }
    }

    fn transfer(&mut self, handoff: Handoff<T>) -> Result<()> {
        if self.direction == Direction::ProducerRunning {
            // A panic escaped the body in the middle of a transfer.
            return Err(Error::new(ErrorKind::ProtocolViolation));
        }
        if self.state == ChannelState::Finished {
            return Err(Error::new(ErrorKind::ChannelClosed));
        }
        let coroutine = self
            .coroutine
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::ChannelClosed))?;

        let name = label(self.name.as_deref());
        if self.state == ChannelState::Created {
            debug!("[{}] Starting producer", name);
        }
        let carries_value = matches!(handoff, Handoff::Value(_));
        trace!("[{}] Transfer to producer, value={}", name, carries_value);

        self.stats.transfers += 1;
        if carries_value {
            self.stats.values_sent += 1;
        }

        self.direction = Direction::ProducerRunning;
        let result = coroutine.resume(handoff);
        self.direction = Direction::ConsumerRunning;

        match result {
            CoroutineResult::Yield(value) => {
                trace!("[{}] Producer suspended, value={}", name, value.is_some());
                if value.is_some() {
                    self.stats.values_yielded += 1;
                }
                self.current = value;
                self.state = ChannelState::Suspended;
            }
            CoroutineResult::Return(()) => {
                debug!("[{}] Producer finished after {} transfers", name, self.stats.transfers);
                self.finish();
            }
        }
        Ok(())
    }

    /// Marks the channel finished and releases the coroutine, unwinding the
    /// body's stack if it is still suspended.
    fn finish(&mut self) {
        self.current = None;
        self.state = ChannelState::Finished;
        self.coroutine = None;
    }
}

impl<T: 'static> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("has_current", &self.current.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

fn label(name: Option<&str>) -> &str {
    name.unwrap_or("<unnamed>")
}

fn run_body<T, F>(yielder: &Yielder<Handoff<T>, Option<T>>, first: Handoff<T>, body: F)
where
    F: FnOnce(&mut Producer<'_, T>),
{
    let mut producer = Producer::new(yielder, first);
    body(&mut producer);
}

/// Iterator over the values a producer yields, see [`Channel::sequence`].
pub struct Sequence<'c, T: 'static> {
    channel: &'c mut Channel<T>,
}

impl<T: 'static> Iterator for Sequence<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(value) = self.channel.take_current() {
            return Some(value);
        }
        while self.channel.is_open() {
            if let Err(e) = self.channel.resume() {
                debug!("[{}] Sequence ended early: {}", label(self.channel.name()), e);
                return None;
            }
            if let Some(value) = self.channel.take_current() {
                return Some(value);
            }
        }
        None
    }
}

impl<T: 'static> FusedIterator for Sequence<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    fn counting() -> Channel<i32> {
        Channel::new(|producer| {
            producer.yield_(1);
            producer.yield_(2);
            producer.yield_(3);
        })
    }

    #[test]
    fn test_channel_starts_unrun() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let channel = Channel::<i32>::new(move |_| flag.set(true));

        assert!(channel.is_open());
        assert_eq!(channel.state(), ChannelState::Created);
        assert_eq!(channel.current(), None);
        assert!(!ran.get());
    }

    #[test]
    fn test_yields_observed_in_order() {
        let mut channel = counting();

        for expected in 1..=3 {
            channel.resume().unwrap();
            assert!(channel.is_open());
            assert_eq!(channel.current(), Some(&expected));
            assert_eq!(channel.direction(), Direction::ConsumerRunning);
        }

        channel.resume().unwrap();
        assert!(!channel.is_open());
        assert_eq!(channel.current(), None);
    }

    #[test]
    fn test_transfer_on_closed_channel() {
        let mut channel = counting();
        while channel.is_open() {
            channel.resume().unwrap();
        }

        let err = channel.send(42).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChannelClosed);
        assert_eq!(channel.resume().unwrap_err().kind(), ErrorKind::ChannelClosed);
        assert_eq!(channel.current(), None);
        assert_eq!(channel.state(), ChannelState::Finished);
    }

    #[test]
    fn test_body_returns_without_yielding() {
        let mut channel = Channel::<String>::new(|_| {});

        channel.send("ignored".to_string()).unwrap();
        assert!(!channel.is_open());
        assert_eq!(channel.current(), None);
    }

    #[test]
    fn test_yield_overwrites_untaken_value() {
        let mut channel = Channel::<i32>::new(|producer| {
            producer.yield_(1);
            producer.yield_(2);
            producer.suspend();
        });

        channel.resume().unwrap();
        channel.resume().unwrap();
        assert_eq!(channel.current(), Some(&2));

        channel.resume().unwrap();
        assert_eq!(channel.current(), None);
    }

    #[test]
    fn test_text_scenario() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut channel = Channel::new(move |producer: &mut Producer<'_, String>| {
            log.borrow_mut().push(producer.receive().unwrap().clone());
            producer.suspend();
            log.borrow_mut().push(producer.receive().unwrap().clone());
            producer.suspend();
        });

        channel.send("hello".to_string()).unwrap();
        assert_eq!(channel.current(), None);
        channel.send("world".to_string()).unwrap();
        assert_eq!(channel.current(), None);

        assert!(channel.is_open());
        assert_eq!(*seen.borrow(), vec!["hello", "world"]);
    }

    #[test]
    fn test_sequence_single_pass() {
        let mut channel = counting();

        let values: Vec<_> = channel.sequence().collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert!(!channel.is_open());
        assert_eq!(channel.sequence().next(), None);
    }

    #[test]
    fn test_sequence_resumes_where_left_off() {
        let mut channel = counting();

        channel.resume().unwrap();
        assert_eq!(channel.take_current(), Some(1));
        assert_eq!(channel.sequence().next(), Some(2));

        channel.resume().unwrap();
        assert_eq!(channel.current(), Some(&3));
        assert_eq!(channel.sequence().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_sequence_skips_empty_suspensions() {
        let mut channel = Channel::<i32>::new(|producer| {
            producer.yield_(1);
            producer.suspend();
            producer.suspend();
            producer.yield_(2);
        });

        assert_eq!(channel.sequence().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_close_before_start() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let mut channel = Channel::<i32>::new(move |_| flag.set(true));

        channel.close().unwrap();
        assert!(!channel.is_open());
        assert!(!ran.get());
        assert_eq!(channel.send(1).unwrap_err().kind(), ErrorKind::ChannelClosed);

        // idempotent
        channel.close().unwrap();
    }

    #[test]
    fn test_close_unwinds_suspended_body() {
        struct Guard(Rc<Cell<bool>>);

        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let guard = Guard(dropped.clone());
        let mut channel = Channel::<i32>::new(move |producer| {
            let _guard = guard;
            loop {
                producer.yield_(7);
            }
        });

        channel.resume().unwrap();
        assert_eq!(channel.current(), Some(&7));
        assert!(!dropped.get());

        channel.close().unwrap();
        assert!(!channel.is_open());
        assert_eq!(channel.current(), None);
        assert!(dropped.get());
    }

    #[test]
    fn test_drop_unwinds_suspended_body() {
        let shared = Rc::new(());
        let held = shared.clone();
        let mut channel = Channel::<i32>::new(move |producer| {
            let _held = held;
            producer.suspend();
        });

        channel.resume().unwrap();
        assert_eq!(Rc::strong_count(&shared), 2);

        drop(channel);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn test_stats() {
        let mut channel = Channel::<i32>::new(|producer| {
            let value = producer.take().unwrap();
            producer.yield_(value * 2);
            producer.suspend();
        });

        channel.send(21).unwrap();
        assert_eq!(channel.take_current(), Some(42));
        channel.resume().unwrap();
        channel.resume().unwrap();

        let stats = channel.stats();
        assert_eq!(stats.transfers, 3);
        assert_eq!(stats.values_sent, 1);
        assert_eq!(stats.values_yielded, 1);
    }

    #[test]
    fn test_with_config() {
        let config = ChannelConfig::new()
            .with_stack_size(64 * 1024)
            .with_name("squares");
        let mut channel = Channel::with_config(config, |producer| {
            for i in 1..=4u64 {
                producer.yield_(i * i);
            }
        })
        .unwrap();

        assert_eq!(channel.name(), Some("squares"));
        assert_eq!(channel.sequence().sum::<u64>(), 30);
    }

    #[test]
    fn test_default_stack_size() {
        assert_eq!(ChannelConfig::default().stack_size, crate::DEFAULT_STACK_SIZE);

        let mut channel = Channel::with_config(ChannelConfig::default(), |producer| {
            producer.yield_(1u8);
        })
        .unwrap();
        assert_eq!(channel.name(), None);
        assert_eq!(channel.sequence().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_panic_on_first_transfer_poisons_channel() {
        let mut channel = Channel::<i32>::new(|_| panic!("producer failed"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| channel.resume()));
        assert!(result.is_err());
        assert_eq!(channel.direction(), Direction::ProducerRunning);
        assert_eq!(channel.close().unwrap_err().kind(), ErrorKind::ProtocolViolation);
        assert_eq!(channel.send(1).unwrap_err().kind(), ErrorKind::ProtocolViolation);
        assert_eq!(channel.sequence().next(), None);
    }

    #[test]
    fn test_panic_in_body_poisons_channel() {
        let mut channel = Channel::<i32>::new(|producer| {
            producer.suspend();
            panic!("producer failed");
        });
        channel.resume().unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| channel.resume()));
        assert!(result.is_err());
        assert_eq!(channel.direction(), Direction::ProducerRunning);
        assert_eq!(channel.send(1).unwrap_err().kind(), ErrorKind::ProtocolViolation);
        assert_eq!(channel.close().unwrap_err().kind(), ErrorKind::ProtocolViolation);
    }
}
