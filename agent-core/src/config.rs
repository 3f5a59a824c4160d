//! Ambient configuration for an agent, fixed at `new_agent` time. No file/env config loading lives here — that surface
//! is explicitly out of scope.

use std::collections::HashMap;
use std::path::PathBuf;

/// Construction-time knobs for an [`crate::Agent`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Capacity of each `send_user_message` local event channel. The
    /// reference implementation documented in spec §9 uses 32; producers
    /// block on a full channel, so a non-consuming consumer stalls the
    /// turn loop by design.
    pub channel_capacity: usize,
    /// Working directory handed to every [`agent_types::ToolContext`] this
    /// agent builds for its tool invocations.
    pub cwd: PathBuf,
    /// Environment variables handed to every tool invocation.
    pub environment: HashMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            cwd: PathBuf::from("."),
            environment: HashMap::new(),
        }
    }
}
