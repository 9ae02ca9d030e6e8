use super::CheckpointModel;
use crate::time::{Duration, Time};

/// Checkpoint and restart overheads that do not depend on how long the
/// job has been running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Static {
    pub checkpoint: Duration,
    pub restart: Duration,
}

impl Static {
    pub fn new(checkpoint: Duration, restart: Duration) -> Self {
        Static {
            checkpoint,
            restart,
        }
    }
}

impl Default for Static {
    fn default() -> Self {
        Static::new(1.0, 1.0)
    }
}

impl CheckpointModel for Static {
    fn checkpoint_cost(&self, _ts: Time) -> Duration {
        self.checkpoint
    }

    fn restart_cost(&self, _ts: Time) -> Duration {
        self.restart
    }
}
