//! Wire messages
//!
//! A [`Message`] is the unit exchanged over every `BoundedChannel`, in both
//! directions. Exactly one message is in flight per direction at any time:
//! the channels are strict request/reply pairs.
//!
//! Requests carry a control command (`reset`, `stop`, `getstat`, `render`,
//! `get_data`, `done`, `ping`) or an agent [`Action`]; replies carry status
//! strings, statistics, renderings, step tuples, or data payloads.

use crate::episode::{EpisodeResult, InfoRecord};
use crate::sample::{ResetConfig, SampleConfig, SampleStats, TrialSample};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Agent action token, defaulting to `hold` on non-communicated ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Hold,
    Buy,
    Sell,
    Close,
}

/// Render target requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Raw market view for humans.
    Human,
    /// Agent-side processed observation.
    Agent,
    /// Whole-episode summary plot, produced after the run.
    Episode,
}

/// Renderable payload keyed by mode. Frames are opaque to the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub frames: BTreeMap<RenderMode, Value>,
}

impl RenderPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mode: RenderMode, frame: Value) {
        self.frames.insert(mode, frame);
    }
}

/// Readiness of the data provider, as an explicit status rather than a
/// marker string inside a free-form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// Sample is available, together with whole-dataset statistics.
    Ready {
        sample: TrialSample,
        stat: SampleStats,
    },
    /// Domain dataset is still being prepared; retry later.
    NotReady,
}

/// Reply to a `get_data` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReply {
    pub status: DataStatus,
}

impl DataReply {
    pub fn ready(sample: TrialSample, stat: SampleStats) -> Self {
        Self {
            status: DataStatus::Ready { sample, stat },
        }
    }

    pub fn not_ready() -> Self {
        Self {
            status: DataStatus::NotReady,
        }
    }
}

/// Episode-mode step reply: the `(state, reward, done, info)` tuple.
///
/// `info` carries exactly one record on the wire (the latest); the full
/// batch accumulated since the previous communicated tick is retained by
/// the step hook for rendering and final statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReply {
    pub state: Value,
    pub reward: f64,
    pub done: bool,
    pub info: Vec<InfoRecord>,
}

/// The message vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    // --- requests ---
    /// Rewind the engine and run a new episode.
    Reset { kwargs: ResetConfig },
    /// Shut the session down.
    Stop,
    /// Retrieve the last completed episode's results.
    GetStat,
    /// Produce renderings for the given modes.
    Render { modes: Vec<RenderMode> },
    /// Ask the data provider for a trial sample.
    GetData { kwargs: SampleConfig },
    /// Force-terminate the current episode.
    Done,
    /// Liveness probe.
    Ping,
    /// Agent action for the current step.
    Action(Action),

    // --- replies ---
    /// Acknowledgement, farewell or diagnostic string.
    Status(String),
    /// Usage hint sent in place of any unrecognized control request.
    Hint(String),
    /// Last completed episode's result record.
    Stat(EpisodeResult),
    /// Rendered frames.
    Rendered(RenderPayload),
    /// Step tuple.
    Step(StepReply),
    /// Data provider reply.
    Data(DataReply),
}

impl Message {
    /// Usage hint listing the accepted control commands.
    pub fn usage_hint() -> Self {
        Message::Hint("send control keys: <reset>, <getstat>, <render>, <stop>".to_string())
    }
}
