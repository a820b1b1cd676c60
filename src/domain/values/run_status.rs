use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall status of a run: the worst status among its sub-components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Degraded,
    Error,
}

impl RunStatus {
    /// Combine two statuses, keeping the worse one.
    pub fn worst(self, other: RunStatus) -> RunStatus {
        self.max(other)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ok => write!(f, "ok"),
            RunStatus::Degraded => write!(f, "degraded"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_prefers_error() {
        assert_eq!(RunStatus::Ok.worst(RunStatus::Degraded), RunStatus::Degraded);
        assert_eq!(RunStatus::Degraded.worst(RunStatus::Error), RunStatus::Error);
        assert_eq!(RunStatus::Ok.worst(RunStatus::Ok), RunStatus::Ok);
    }
}
