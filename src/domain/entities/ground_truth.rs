use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A curated breakout event used to score backtest predictions.
///
/// The registry of these is append-only and is consulted only by the
/// scorecard — never by the prediction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthEvent {
    pub entity_id: String,
    pub category: String,
    /// When early signals first appeared.
    pub early_signal_date: NaiveDate,
    /// When the entity broke into the mainstream.
    pub breakout_date: NaiveDate,
    /// Mainstream outlets that covered it, in order of coverage.
    #[serde(default)]
    pub mainstream_sources: Vec<String>,
    /// Which signal types should have fired ahead of the breakout.
    #[serde(default)]
    pub expected_signal_types: Vec<String>,
}
