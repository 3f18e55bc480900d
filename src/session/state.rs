use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Opening,
    Configuring,
    Active,
    Stopping,
    Failed,
}

impl SessionState {
    /// The lifecycle's transition table.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Opening)
                | (Opening, Configuring)
                | (Opening, Failed)
                | (Opening, Stopping)
                | (Configuring, Active)
                | (Configuring, Failed)
                | (Configuring, Stopping)
                | (Active, Stopping)
                | (Active, Failed)
                | (Stopping, Idle)
                | (Failed, Idle)
        )
    }

    /// States in which the bundle may hold host handles.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionState::Opening | SessionState::Configuring | SessionState::Active
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Opening => "opening",
            SessionState::Configuring => "configuring",
            SessionState::Active => "active",
            SessionState::Stopping => "stopping",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    /// Start attempt this transition belongs to.
    pub generation: u64,
}
