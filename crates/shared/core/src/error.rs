//! Shared error taxonomy for the coordination core
//!
//! Channel, protocol and data errors are domain vocabulary: every crate in
//! the workspace branches on them, so they live in the shared kernel.

use thiserror::Error;

/// Transport-level failures on a bounded channel exchange leg.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The configured send or receive deadline elapsed.
    #[error("channel operation timed out")]
    TimedOut,

    /// Any other transport fault (peer gone, endpoint closed).
    #[error("transport fault: {0}")]
    Transport(String),

    /// Request/reply discipline violated; not recoverable by retry.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A bounded timeout must be strictly positive.
    #[error("bounded timeout must be strictly positive")]
    InvalidTimeout,
}

/// Violations of the request/reply contract with the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// An episode-mode message carried neither a control command nor an action.
    #[error("no action in episode-mode request")]
    MissingAction,

    /// A control command that is not valid in the current mode.
    #[error("unknown control command in episode mode: {0}")]
    UnknownControl(String),

    /// A send/receive out of turn on a request/reply paired channel.
    #[error("request/reply exchange out of order")]
    OutOfOrderExchange,
}

/// Failures while acquiring trial data from the data provider.
///
/// Both variants are session-fatal: a backtest session cannot proceed
/// without data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The provider did not answer an exchange; not retried, since it
    /// indicates a transport or process problem, not a readiness gap.
    #[error("data provider unreachable: {0}")]
    Unreachable(String),

    /// The provider kept reporting "not ready" past the wait budget.
    #[error("data provider failed to become ready within the wait budget")]
    Timeout,
}

/// Failures while deriving an episode slice from a trial sample.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("sample holds no rows")]
    Empty,

    /// Requested episode window does not fit inside the trial.
    #[error("episode window [{start}, {start}+{len}) exceeds {rows} trial rows")]
    OutOfRange { start: usize, len: usize, rows: usize },
}
