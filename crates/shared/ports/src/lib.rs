//! Kairos Ports
//!
//! Port definitions (traits) for the Kairos backtest environment server.
//! These define the boundaries to the external collaborators: the
//! backtesting engine, the renderer, and the per-tick hook the engine
//! calls back into.

mod engine;
mod error;
mod render;

pub use engine::{Engine, EngineRun, Observer, TickHook, TickView};
pub use error::{EngineError, HookError};
pub use render::Renderer;
