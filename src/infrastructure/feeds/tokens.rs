use crate::domain::error::DomainError;
use crate::domain::ports::market_feed::{MarketFeed, RawMarketObservation};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Token price feed using the CoinGecko market-chart API (no auth).
pub struct TokenFeed {
    token_ids: Vec<String>,
    client: reqwest::Client,
}

impl TokenFeed {
    pub fn new(token_ids: Vec<String>) -> Self {
        Self {
            token_ids,
            client: reqwest::Client::builder()
                .user_agent("trendintel/0.1")
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct MarketChart {
    /// [[timestamp_ms, price], ...] oldest first.
    prices: Vec<(f64, f64)>,
}

#[async_trait]
impl MarketFeed for TokenFeed {
    fn name(&self) -> &str {
        "tokens"
    }

    fn expected_instruments(&self) -> usize {
        self.token_ids.len()
    }

    async fn fetch(
        &self,
        _as_of: NaiveDate,
        _window_days: u32,
    ) -> Result<Vec<RawMarketObservation>, DomainError> {
        let mut observations = Vec::new();
        for token_id in &self.token_ids {
            match self.fetch_one(token_id).await {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    eprintln!("Warning: tokens fetch failed for {token_id}: {e}");
                }
            }
        }
        Ok(observations)
    }
}

impl TokenFeed {
    async fn fetch_one(&self, token_id: &str) -> Result<RawMarketObservation, DomainError> {
        let url = format!(
            "https://api.coingecko.com/api/v3/coins/{token_id}/market_chart?vs_currency=usd&days=30&interval=daily"
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::Network(format!(
                "CoinGecko returned {} for {token_id}",
                resp.status()
            )));
        }

        let chart: MarketChart = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(e.to_string()))?;

        let prices: Vec<f64> = chart.prices.iter().map(|(_, p)| *p).collect();
        let latest = *prices
            .last()
            .ok_or_else(|| DomainError::Parse(format!("No prices for {token_id}")))?;

        let observed_at = chart
            .prices
            .last()
            .and_then(|(ts_ms, _)| DateTime::<Utc>::from_timestamp((*ts_ms as i64) / 1000, 0))
            .unwrap_or_else(Utc::now);

        Ok(RawMarketObservation {
            symbol: token_id.to_string(),
            observed_at,
            value: latest,
            change_1d_pct: change_over(&prices, 1),
            change_7d_pct: change_over(&prices, 7),
            change_30d_pct: change_over(&prices, prices.len().saturating_sub(1)),
            volume_ratio: None,
            z_score: None,
        })
    }
}

fn change_over(prices: &[f64], days: usize) -> Option<f64> {
    if days == 0 || prices.len() <= days {
        return None;
    }
    let latest = *prices.last()?;
    let base = prices[prices.len() - 1 - days];
    if base <= 0.0 {
        return None;
    }
    Some((latest - base) / base * 100.0)
}
