use kairos_core::{ChannelError, ProtocolError};
use thiserror::Error;

/// Failures raised by the per-tick hook while an episode runs.
///
/// The engine aborts its run and surfaces these unchanged; they are
/// session-fatal (the contract with the controller is broken).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Failures from the backtesting engine during an episode run.
///
/// Engine state after a fault is not trusted; no episode-level recovery is
/// attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine fault: {0}")]
    Fault(String),

    #[error("tick hook failed: {0}")]
    Hook(#[from] HookError),
}
