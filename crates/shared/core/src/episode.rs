//! Episode records
//!
//! Per-tick info records accumulated by the step hook, the step snapshot
//! backed up for deferred rendering, and the per-episode result record
//! served by `getstat`.

use crate::message::Action;
use crate::sample::{SampleMetadata, SampleStats};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-tick auxiliary information from the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub tick: u64,
    pub action: Action,
    pub reward: f64,
    /// Current portfolio value.
    pub broker_value: Decimal,
    /// Last broker event, `-` when quiet.
    pub broker_message: String,
}

/// Backed-up communicated step, kept for rendering under skip-frame:
/// without it a render request would show state from "the future" relative
/// to what the agent last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub raw_state: Value,
    pub state: Value,
    pub reward: f64,
    pub done: bool,
    /// Full info batch accumulated since the previous communicated tick.
    pub info: Vec<InfoRecord>,
}

/// Result record of one completed episode.
///
/// The default value is the empty record `getstat` serves before the first
/// episode completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub episode: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub runtime: Duration,
    /// Engine ticks the episode ran for.
    pub length: u64,
    /// Named analyzer results harvested from the engine run.
    pub analyzers: BTreeMap<String, Value>,
}

/// Descriptive statistics injected into the engine's strategy parameters
/// before each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub trial_stat: SampleStats,
    pub trial_metadata: SampleMetadata,
    pub dataset_stat: SampleStats,
    pub episode_stat: SampleStats,
    pub episode_metadata: SampleMetadata,
}
