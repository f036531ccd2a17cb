//! Kairos Server - Backtest Environment Coordination Core
//!
//! Exposes a stateful backtesting engine to a learning agent over a
//! synchronous request/reply protocol shaped like an episodic
//! environment API (`reset`, `step`, `render`, `getstat`, `stop`):
//!
//! - **Session**: the outer two-mode state machine (control mode /
//!   episode mode) owning both channels
//! - **Episode Runner**: per-episode engine setup, data resolution and
//!   result harvesting
//! - **Step Exchange**: the per-tick hook the engine calls back into,
//!   where engine time and controller time synchronize
//!
//! ## Architecture
//!
//! ```text
//!  Controller (agent)                     Data provider
//!        │ req/rep                            │ req/rep
//!        ▼                                    ▼
//!  ┌───────────────┐                 ┌─────────────────┐
//!  │ BoundedChannel│                 │ BoundedChannel  │
//!  └──────┬────────┘                 └────────┬────────┘
//!         │                                   │
//!  ┌──────▼───────────────────┐      ┌────────▼────────┐
//!  │         Session          │─────▶│ DataAcquisition │
//!  │  control mode ⇄ episode  │      └─────────────────┘
//!  └──────┬───────────────────┘
//!         │ reset
//!  ┌──────▼────────┐   per tick   ┌──────────────┐
//!  │ EpisodeRunner │◀────────────▶│ StepExchange │
//!  └──────┬────────┘              └──────▲───────┘
//!         │ run                          │ on_tick
//!  ┌──────▼──────────────────────────────┴──┐
//!  │        Backtesting engine (port)       │
//!  └────────────────────────────────────────┘
//! ```
//!
//! Exactly one controller talks to exactly one session over exactly one
//! channel; the session is a single sequential task with no internal
//! parallelism.

pub mod config;
pub mod episode;
pub mod session;
pub mod step;

mod error;

// Re-export main types
pub use config::SessionConfig;
pub use error::SessionError;
pub use session::Session;
pub use step::StepExchange;
