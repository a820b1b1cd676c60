use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude of disagreement between the growth and risk sub-scores.
///
/// Bands partition |technical - commercial| exhaustively:
/// HIGH > 40, MEDIUM in (20, 40], LOW <= 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictIntensity {
    High,
    Medium,
    Low,
}

impl ConflictIntensity {
    pub fn from_gap(gap: f64) -> Self {
        let gap = gap.abs();
        if gap > 40.0 {
            ConflictIntensity::High
        } else if gap > 20.0 {
            ConflictIntensity::Medium
        } else {
            ConflictIntensity::Low
        }
    }
}

impl fmt::Display for ConflictIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictIntensity::High => write!(f, "HIGH"),
            ConflictIntensity::Medium => write!(f, "MEDIUM"),
            ConflictIntensity::Low => write!(f, "LOW"),
        }
    }
}

/// What the arbiter recommends doing about an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Alert,
    Investigate,
    Monitor,
    Ignore,
}

impl Recommendation {
    /// Fixed precedence: ALERT beats INVESTIGATE when both rules fire.
    /// A high-conviction, high-conflict case satisfies two rules at once,
    /// so the order here is load-bearing.
    pub fn decide(conviction: f64, conflict: ConflictIntensity) -> Self {
        if conviction > 80.0 {
            Recommendation::Alert
        } else if conflict == ConflictIntensity::High {
            Recommendation::Investigate
        } else if conviction >= 40.0 {
            Recommendation::Monitor
        } else {
            Recommendation::Ignore
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Alert => write!(f, "ALERT"),
            Recommendation::Investigate => write!(f, "INVESTIGATE"),
            Recommendation::Monitor => write!(f, "MONITOR"),
            Recommendation::Ignore => write!(f, "IGNORE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_bands_are_exhaustive_and_exclusive() {
        assert_eq!(ConflictIntensity::from_gap(0.0), ConflictIntensity::Low);
        assert_eq!(ConflictIntensity::from_gap(20.0), ConflictIntensity::Low);
        assert_eq!(ConflictIntensity::from_gap(20.1), ConflictIntensity::Medium);
        assert_eq!(ConflictIntensity::from_gap(40.0), ConflictIntensity::Medium);
        assert_eq!(ConflictIntensity::from_gap(40.1), ConflictIntensity::High);
        assert_eq!(ConflictIntensity::from_gap(-55.0), ConflictIntensity::High);
    }

    #[test]
    fn test_alert_wins_over_investigate() {
        // conviction > 80 with HIGH conflict satisfies both rules
        let rec = Recommendation::decide(86.5, ConflictIntensity::High);
        assert_eq!(rec, Recommendation::Alert);
    }

    #[test]
    fn test_investigate_on_high_conflict_below_alert() {
        let rec = Recommendation::decide(70.0, ConflictIntensity::High);
        assert_eq!(rec, Recommendation::Investigate);
    }

    #[test]
    fn test_monitor_band() {
        assert_eq!(
            Recommendation::decide(40.0, ConflictIntensity::Low),
            Recommendation::Monitor
        );
        assert_eq!(
            Recommendation::decide(79.9, ConflictIntensity::Medium),
            Recommendation::Monitor
        );
    }

    #[test]
    fn test_ignore_below_monitor() {
        assert_eq!(
            Recommendation::decide(39.9, ConflictIntensity::Low),
            Recommendation::Ignore
        );
    }
}
