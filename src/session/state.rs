use serde::{Deserialize, Serialize};

/// Lifecycle phase of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Initializing,
    Streaming,
    /// Streaming, with a one-shot catch-up fetch in flight.
    Reconciling,
    /// Stream abandoned; results come from the poll fallback.
    Polling,
    Completed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Streaming => "streaming",
            Self::Reconciling => "reconciling",
            Self::Polling => "polling",
            Self::Completed => "completed",
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming | Self::Reconciling)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
