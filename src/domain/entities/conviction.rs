use crate::domain::values::recommendation::{ConflictIntensity, Recommendation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which grading curve the risk stage applies. Classification happens first
/// and shapes everything downstream: what counts as a red flag, which
/// missing fields matter, and the arbiter's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityClassification {
    OssProject,
    CommercialSaas,
}

impl fmt::Display for EntityClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityClassification::OssProject => write!(f, "OSS_PROJECT"),
            EntityClassification::CommercialSaas => write!(f, "COMMERCIAL_SAAS"),
        }
    }
}

impl FromStr for EntityClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OSS_PROJECT" => Ok(EntityClassification::OssProject),
            "COMMERCIAL_SAAS" => Ok(EntityClassification::CommercialSaas),
            _ => Err(format!("Unknown classification: {s}")),
        }
    }
}

/// A red flag raised by the risk stage, ranked by severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlag {
    pub severity: u8,
    pub label: String,
    pub detail: String,
}

/// The synthesized verdict on one entity as of one analysis date.
///
/// Keyed by (entity_id, analysis_date) and append-only: a new analysis for
/// the same key never overwrites the stored one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvictionAssessment {
    pub entity_id: String,
    pub analysis_date: NaiveDate,
    pub classification: EntityClassification,
    pub technical_velocity_score: f64,
    pub commercial_maturity_score: f64,
    pub brand_safety_score: f64,
    pub conviction_score: f64,
    pub conflict_intensity: ConflictIntensity,
    pub recommendation: Recommendation,
    pub bull_thesis: String,
    pub bear_thesis: String,
    pub red_flags: Vec<RedFlag>,
    pub missing_critical_signals: Vec<String>,
}
