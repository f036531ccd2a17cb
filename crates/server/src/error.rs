use kairos_core::{ChannelError, DataError, ProtocolError, SampleError};
use kairos_ports::EngineError;
use thiserror::Error;

/// Session-fatal failures.
///
/// Everything that reaches this level terminates the run: the session
/// notifies the data provider best-effort, releases both channels and
/// exits. The controller observes this as channel closure.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("controller channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("data acquisition: {0}")]
    Data(#[from] DataError),

    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("episode sampling: {0}")]
    Sample(#[from] SampleError),

    #[error("engine run: {0}")]
    Engine(#[from] EngineError),
}
