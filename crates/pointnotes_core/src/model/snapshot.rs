use serde::{Deserialize, Serialize};

/// Point-in-time copy of the controller's in-memory state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Notes in insertion order.
    pub notes: Vec<String>,
    /// Current points counter.
    pub points: u64,
}
