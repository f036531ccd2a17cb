//! Engine boundary
//!
//! The backtesting engine is an external collaborator. It accepts an
//! injected data feed, auxiliary observers and strategy statistics, then
//! runs synchronously to completion, invoking the injected [`TickHook`]
//! once per simulation tick (an inversion of control: the engine calls
//! into the coordination core, not vice versa). It guarantees to respect a
//! halt signaled through [`TickView::halt`].

use crate::error::{EngineError, HookError};
use async_trait::async_trait;
use kairos_core::{Action, Feed, InfoRecord, StrategyStats};
use serde_json::Value;
use std::collections::BTreeMap;

/// Auxiliary observers attached to every episode's engine copy.
///
/// `DrawDown` is mandatory; the plotting observers are only attached when
/// rendering is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observer {
    DrawDown,
    NormPnl,
    Position,
    Reward,
}

/// Outcome of a completed engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineRun {
    /// Number of ticks the run lasted.
    pub length: u64,
    /// Named analyzer results. The step hook is not an analyzer and never
    /// appears here.
    pub analyzers: BTreeMap<String, Value>,
}

/// What the per-tick hook can see and poke on the running engine.
pub trait TickView: Send {
    /// Natural termination flag (data exhausted, margin call, ...).
    fn is_done(&self) -> bool;

    /// Info record for the current tick.
    fn info(&self) -> InfoRecord;

    /// Unprocessed market state, for human-mode rendering.
    fn raw_state(&self) -> Value;

    /// Processed observation tensor handed to the agent.
    fn state(&self) -> Value;

    /// Reward for the current tick.
    fn reward(&self) -> f64;

    /// Set the action the engine executes on this tick.
    fn set_action(&mut self, action: Action);

    /// Close the open position and stop the run; no further ticks occur.
    fn halt(&mut self);
}

/// Per-tick callback injected into the engine before each run.
#[async_trait]
pub trait TickHook: Send {
    async fn on_tick(&mut self, view: &mut dyn TickView) -> Result<(), HookError>;
}

/// The backtesting engine boundary.
///
/// Implementations are cloned per episode by the runner; mutations during
/// one episode never leak into the template used for the next.
#[async_trait]
pub trait Engine: Send {
    /// Add an episode's data feed.
    fn add_feed(&mut self, feed: Feed);

    /// Observers currently attached.
    fn observers(&self) -> &[Observer];

    /// Attach an auxiliary observer.
    fn add_observer(&mut self, observer: Observer);

    /// Inject trial/episode/dataset statistics into the strategy parameters.
    fn set_strategy_stats(&mut self, stats: StrategyStats);

    /// Run to completion, calling `hook` once per tick. Returns only after
    /// the hook has driven the run to termination.
    async fn run(&mut self, hook: &mut dyn TickHook) -> Result<EngineRun, EngineError>;
}
