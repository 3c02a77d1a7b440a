//! Runtime core and public API
//!
//! Two subsystems are driven by the same external tick: the activity tree
//! ([`activity`], [`sequence`], [`stack`]) updates the machine's outputs,
//! and the [`recorder`] captures or replays the machine's state. The
//! [`control::Host`] wires both to a [`control::Machine`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Submodules
pub mod activity;
pub mod control;
pub mod drive;
pub mod error;
pub mod recorder;
pub mod registry;
pub mod sequence;
pub mod snapshot;
pub mod stack;
pub mod storage;

/// Configuration for the tickloop runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Root directory for runtime storage (default: .tickloop/)
    pub root: PathBuf,

    /// Period of the external tick, in milliseconds
    pub tick_period_ms: u64,

    /// Script replayed when autonomous mode starts
    pub autonomous_script: String,

    /// Enable debug tracing
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".tickloop"),
            tick_period_ms: 20,
            autonomous_script: registry::EMPTY_SCRIPT.to_string(),
            debug: false,
        }
    }
}

impl RuntimeConfig {
    /// Reject settings the host cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(RuntimeError::Config(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.autonomous_script.is_empty() {
            return Err(RuntimeError::Config(
                "autonomous_script must name a script".to_string(),
            ));
        }
        Ok(())
    }
}

// Re-export commonly used types
pub use activity::{Activity, ActivityExt, BoxedActivity};
pub use control::{Host, Machine, Phase};
pub use error::{Result, RuntimeError};
pub use recorder::{PlaybackActivity, Recorder, RecorderMode};
pub use registry::{ScriptCatalog, ScriptRegistry, EMPTY_SCRIPT};
pub use sequence::Sequence;
pub use snapshot::{Reel, Snapshot};
pub use stack::Stack;
pub use storage::ScriptStore;
