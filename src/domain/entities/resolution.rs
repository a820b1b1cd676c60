use crate::domain::values::entity_type::EntityType;
use crate::domain::values::match_tier::MatchTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which path produced the winning candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPath {
    /// Raw name was itself a registry id.
    Registry,
    Tier1,
    Tier2,
    Tier3,
    Unresolved,
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPath::Registry => write!(f, "registry"),
            ResolutionPath::Tier1 => write!(f, "tier1"),
            ResolutionPath::Tier2 => write!(f, "tier2"),
            ResolutionPath::Tier3 => write!(f, "tier3"),
            ResolutionPath::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// One rule that fired during matching, with the confidence it added.
/// The ordered trace makes tier-2 boosts auditable instead of ad hoc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFiring {
    pub rule: String,
    pub delta: f64,
}

/// A candidate entity for a raw mention, ranked by confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub tier: MatchTier,
    pub confidence: f64,
    /// Rules that fired, in evaluation order.
    pub trace: Vec<RuleFiring>,
}

/// Outcome of resolving one raw name against a registry version.
///
/// A pure, deterministic function of (raw_name, registry version, nearby
/// context) produces this, so backtests replaying the same inputs get
/// bit-identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityResolution {
    pub raw_name: String,
    pub registry_version: u64,
    /// Top candidate, unless everything fell below the resolution floor.
    pub primary: Option<CandidateMatch>,
    /// All surviving candidates, best first.
    pub candidates: Vec<CandidateMatch>,
    /// Confidence of the primary, or 0.0 when unresolved.
    pub confidence: f64,
    /// Denylist terms that matched without their required context.
    pub ambiguity_flags: Vec<String>,
    pub path: ResolutionPath,
}

impl EntityResolution {
    pub fn unresolved(raw_name: &str, registry_version: u64, flags: Vec<String>) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            registry_version,
            primary: None,
            candidates: Vec::new(),
            confidence: 0.0,
            ambiguity_flags: flags,
            path: ResolutionPath::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.primary.is_some()
    }
}
