use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly a raw mention was tied to a canonical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Exact canonical-name or alias match.
    Tier1,
    /// Org/namespace prefix against a registered linked asset.
    Tier2,
    /// Substring containment, context-qualified.
    Tier3,
}

impl MatchTier {
    /// Weight used by the validation gate and corroboration scoring.
    pub fn weight(&self) -> f64 {
        match self {
            MatchTier::Tier1 => 1.0,
            MatchTier::Tier2 => 0.6,
            MatchTier::Tier3 => 0.2,
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Tier1 => write!(f, "tier1"),
            MatchTier::Tier2 => write!(f, "tier2"),
            MatchTier::Tier3 => write!(f, "tier3"),
        }
    }
}
