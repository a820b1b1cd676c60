use crate::domain::error::DomainError;
use crate::domain::ports::market_feed::{MarketFeed, RawMarketObservation};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

/// A z-score needs enough history to mean anything; series with fewer
/// points are reported without one and the regime composite skips them.
const MIN_HISTORY_POINTS: usize = 10;

/// Macro indicator feed reading FRED's CSV export (no auth).
///
/// Each series fetch returns the full published history; the z-score of the
/// latest value against that history is computed here so the aggregator
/// never needs raw series data.
pub struct MacroFeed {
    series_ids: Vec<String>,
    client: reqwest::Client,
}

impl MacroFeed {
    pub fn new(series_ids: Vec<String>) -> Self {
        Self {
            series_ids,
            client: reqwest::Client::builder()
                .user_agent("trendintel/0.1")
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl MarketFeed for MacroFeed {
    fn name(&self) -> &str {
        "macro"
    }

    fn expected_instruments(&self) -> usize {
        self.series_ids.len()
    }

    async fn fetch(
        &self,
        _as_of: NaiveDate,
        _window_days: u32,
    ) -> Result<Vec<RawMarketObservation>, DomainError> {
        let mut observations = Vec::new();
        for series_id in &self.series_ids {
            match self.fetch_one(series_id).await {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    eprintln!("Warning: macro fetch failed for {series_id}: {e}");
                }
            }
        }
        Ok(observations)
    }
}

impl MacroFeed {
    async fn fetch_one(&self, series_id: &str) -> Result<RawMarketObservation, DomainError> {
        let url = format!("https://fred.stlouisfed.org/graph/fredgraph.csv?id={series_id}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::Network(format!(
                "FRED returned {} for {series_id}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;

        // CSV: header line, then "DATE,VALUE"; missing observations are ".".
        let mut values = Vec::new();
        for line in body.lines().skip(1) {
            let Some((_, value)) = line.split_once(',') else {
                continue;
            };
            if let Ok(v) = value.trim().parse::<f64>() {
                values.push(v);
            }
        }

        let latest = *values
            .last()
            .ok_or_else(|| DomainError::Parse(format!("No observations for {series_id}")))?;

        Ok(RawMarketObservation {
            symbol: series_id.to_string(),
            observed_at: Utc::now(),
            value: latest,
            change_1d_pct: None,
            change_7d_pct: None,
            change_30d_pct: None,
            volume_ratio: None,
            z_score: z_score(&values),
        })
    }
}

/// Z-score of the last value against the whole series. None when the series
/// is too short or has no variance.
pub fn z_score(values: &[f64]) -> Option<f64> {
    if values.len() < MIN_HISTORY_POINTS {
        return None;
    }
    let latest = *values.last()?;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return None;
    }
    Some((latest - mean) / std_dev)
}
