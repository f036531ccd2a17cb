//! Kairos Data
//!
//! Client side of the data-provider channel. The provider is a separate
//! process serving trial samples to many concurrent sessions; readiness
//! polling against it is bounded and jittered so a fleet of sessions does
//! not hammer it in lockstep.

mod acquisition;

pub use acquisition::{DataAcquisition, CONNECT_TIMEOUT, WAIT_BUDGET};
