//! Market feed port for the three financial fetchers.
//!
//! Equities, tokens, and macro indicators are independent I/O-bound units.
//! Each implementor owns its own timeout budget and tolerates per-instrument
//! failures; one feed failing must never block its siblings.

use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One observation for one instrument or series.
///
/// Equities populate the change fields and volume_ratio; macro series
/// populate z_score (requires enough history) and leave volume alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarketObservation {
    /// Ticker symbol, token id, or macro series id.
    pub symbol: String,
    pub observed_at: DateTime<Utc>,
    /// Latest raw value (price, or series level for macro).
    pub value: f64,
    pub change_1d_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
    pub change_30d_pct: Option<f64>,
    /// Current volume vs trailing average, equities only.
    pub volume_ratio: Option<f64>,
    /// Z-score vs the series' own history, macro only. None when the
    /// series has too little history to standardize.
    pub z_score: Option<f64>,
}

impl RawMarketObservation {
    /// Percent change for the requested window, when the feed supplied it.
    pub fn change_for_window(&self, window_days: u32) -> Option<f64> {
        match window_days {
            0..=1 => self.change_1d_pct,
            2..=7 => self.change_7d_pct,
            _ => self.change_30d_pct,
        }
    }
}

/// A data feed producing market observations for a set of instruments.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Stable name used in health reporting ("equities", "tokens", "macro").
    fn name(&self) -> &str;

    /// How many instruments a healthy fetch should return. Returning fewer
    /// than 80% of this marks the source degraded.
    fn expected_instruments(&self) -> usize;

    /// Fetch observations as of `as_of` for the given change window.
    async fn fetch(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> Result<Vec<RawMarketObservation>, DomainError>;
}
