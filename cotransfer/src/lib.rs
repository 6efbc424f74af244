//! # cotransfer - Cooperative Transfer of Control
//!
//! cotransfer connects exactly two execution contexts, a driver (the
//! *consumer*) and a coroutine body (the *producer*), and moves one value per
//! transfer between them:
//!
//! - **Stackful**: the producer body runs on its own stack and keeps its
//!   locals and position across every suspension
//! - **Ping-pong**: only one side runs at any instant; `send`/`resume` on the
//!   consumer side and `yield_`/`suspend` on the producer side are the only
//!   switch points
//! - **Single slot**: at most one value is buffered in each direction
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   send / resume / close   ┌──────────────────────┐
//! │   Channel<T>         │ ────────────────────────▶ │   Producer<'_, T>    │
//! │   (consumer side)    │                           │   (body's handle)    │
//! │   current, sequence  │ ◀──────────────────────── │   receive, incoming  │
//! └──────────────────────┘     yield_ / suspend      └──────────────────────┘
//!                 └───────────── corosensei stack ───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cotransfer::Channel;
//!
//! let mut numbers = Channel::<i32>::new(|producer| {
//!     producer.yield_(1);
//!     producer.yield_(2);
//!     producer.yield_(3);
//! });
//!
//! let seen: Vec<_> = numbers.sequence().collect();
//! assert_eq!(seen, [1, 2, 3]);
//! assert!(!numbers.is_open());
//! ```

#![warn(missing_docs)]

pub mod channel;
#[allow(missing_docs)]
pub mod config;
#[allow(missing_docs)]
pub mod error;

// Re-export commonly used types
pub use channel::{Channel, ChannelState, ChannelStats, Direction, Incoming, Producer, Sequence};
pub use config::ChannelConfig;
pub use error::{Error, ErrorKind, Result};

/// Default coroutine stack size (1 MiB), used by `ChannelConfig`.
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;
