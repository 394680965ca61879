use serde::{Deserialize, Serialize};

/// Stage of a single sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    Idle,
    Acquiring,
    /// Measuring the channel at this position in the scan list.
    Scanning { index: usize },
    Scoring,
    Publishing,
}

impl ScanState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        use ScanState::*;

        match (self, target) {
            (Idle, Acquiring) => true,

            // Busy: the cycle is abandoned
            (Acquiring, Idle) => true,
            (Acquiring, Scanning { index: 0 }) => true,
            // Empty scan list
            (Acquiring, Scoring) => true,

            (Scanning { index: from }, Scanning { index: to }) => *to == from + 1,
            (Scanning { .. }, Scoring) => true,

            (Scoring, Publishing) => true,
            (Publishing, Idle) => true,

            _ => false,
        }
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Acquiring => "Acquiring",
            Self::Scanning { .. } => "Scanning",
            Self::Scoring => "Scoring",
            Self::Publishing => "Publishing",
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::Idle
    }
}
