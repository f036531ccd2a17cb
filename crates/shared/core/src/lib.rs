//! Kairos Core Domain
//!
//! Pure domain types for the Kairos backtest environment server.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod episode;
pub mod error;
pub mod message;
pub mod sample;

// Re-export commonly used types at crate root
pub use episode::{EpisodeResult, InfoRecord, StepSnapshot, StrategyStats};
pub use error::{ChannelError, DataError, ProtocolError, SampleError};
pub use message::{
    Action, DataReply, DataStatus, Message, RenderMode, RenderPayload, StepReply,
};
pub use sample::{
    Bar, EpisodeSample, Feed, ResetConfig, SampleConfig, SampleKind, SampleMetadata, SampleStats,
    TrialSample,
};
