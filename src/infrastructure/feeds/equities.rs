use crate::domain::error::DomainError;
use crate::domain::ports::market_feed::{MarketFeed, RawMarketObservation};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Equity quote feed using the Yahoo Finance v8 chart API (no auth).
///
/// Fetches a month of daily closes per ticker and derives the 1/7/30-day
/// changes and the volume ratio locally, so one HTTP call serves every
/// window.
pub struct EquityFeed {
    tickers: Vec<String>,
    client: reqwest::Client,
}

impl EquityFeed {
    pub fn new(tickers: Vec<String>) -> Self {
        Self {
            tickers,
            client: reqwest::Client::builder()
                .user_agent(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                     AppleWebKit/537.36 (KHTML, like Gecko) \
                     Chrome/120.0.0.0 Safari/537.36",
                )
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, serde::Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
}

#[derive(Debug, serde::Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, serde::Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[async_trait]
impl MarketFeed for EquityFeed {
    fn name(&self) -> &str {
        "equities"
    }

    fn expected_instruments(&self) -> usize {
        self.tickers.len()
    }

    async fn fetch(
        &self,
        _as_of: NaiveDate,
        _window_days: u32,
    ) -> Result<Vec<RawMarketObservation>, DomainError> {
        let mut observations = Vec::new();
        for ticker in &self.tickers {
            match self.fetch_one(ticker).await {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    eprintln!("Warning: equities fetch failed for {ticker}: {e}");
                }
            }
        }
        Ok(observations)
    }
}

impl EquityFeed {
    async fn fetch_one(&self, ticker: &str) -> Result<RawMarketObservation, DomainError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?range=1mo&interval=1d"
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::Network(format!(
                "Yahoo API returned {} for {ticker}",
                resp.status()
            )));
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(e.to_string()))?;

        if let Some(err) = data.chart.error {
            return Err(DomainError::Parse(format!("Yahoo error: {err}")));
        }

        let chart = data
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| DomainError::Parse("No chart results".into()))?;

        let closes: Vec<f64> = chart
            .indicators
            .quote
            .first()
            .and_then(|q| q.close.as_ref())
            .map(|c| c.iter().filter_map(|v| *v).collect())
            .unwrap_or_default();
        let volumes: Vec<f64> = chart
            .indicators
            .quote
            .first()
            .and_then(|q| q.volume.as_ref())
            .map(|v| v.iter().filter_map(|x| *x).collect())
            .unwrap_or_default();

        let latest = *closes
            .last()
            .ok_or_else(|| DomainError::Parse(format!("No closes for {ticker}")))?;

        let observed_at = chart
            .timestamp
            .as_ref()
            .and_then(|t| t.last())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(*secs, 0))
            .unwrap_or_else(Utc::now);

        let volume_ratio = match (volumes.last(), volumes.len()) {
            (Some(last_vol), n) if n > 1 => {
                let mean: f64 = volumes.iter().sum::<f64>() / n as f64;
                if mean > 0.0 {
                    Some(last_vol / mean)
                } else {
                    None
                }
            }
            _ => None,
        };

        Ok(RawMarketObservation {
            symbol: chart.meta.symbol,
            observed_at,
            value: latest,
            change_1d_pct: change_over(&closes, 1),
            change_7d_pct: change_over(&closes, 5),
            change_30d_pct: change_over(&closes, closes.len().saturating_sub(1)),
            volume_ratio,
            z_score: None,
        })
    }
}

/// Percent change between the last close and the close `sessions` back.
fn change_over(closes: &[f64], sessions: usize) -> Option<f64> {
    if sessions == 0 || closes.len() <= sessions {
        return None;
    }
    let latest = *closes.last()?;
    let base = closes[closes.len() - 1 - sessions];
    if base <= 0.0 {
        return None;
    }
    Some((latest - base) / base * 100.0)
}
