//! Kairos Channel
//!
//! Duplex, message-oriented request/reply transport for the coordination
//! core. A [`BoundedChannel`] endpoint carries [`Message`]s over a pair of
//! tokio mpsc channels with independently configurable send and receive
//! timeouts.
//!
//! Exchanges are strictly request/reply paired: every send from one side
//! must be followed by exactly one receive from the other before either
//! side sends again. Each endpoint tracks whose turn it is and fails an
//! out-of-turn operation with a protocol error that no retry can fix.
//!
//! [`Message`]: kairos_core::Message

mod bounded;

pub use bounded::{BoundedChannel, ExchangeOutcome, Role};
