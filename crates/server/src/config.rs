//! Session configuration

use std::time::Duration;
use uuid::Uuid;

/// Finite deadline on controller-bound sends. Receives from the controller
/// are unbounded: the agent sets its own pace and decision latency is the
/// controller's responsibility, not the core's.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Coordination-core session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identity, carried by every fatal-error log line.
    pub session_id: Uuid,
    /// Worker/task number of this session, for multi-session deployments.
    pub task: u32,
    /// Tick stride at which controller communication occurs during an
    /// episode; all other ticks are free-running. Must be at least 1.
    pub skip_frame: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            task: 0,
            skip_frame: 1,
        }
    }
}
