//! Financial signal refresh: three independent fetchers feeding a
//! bucket-level percentile aggregator and the macro regime composite.
//!
//! The fetchers are bulkheaded: each runs under its own timeout and a
//! failure or shortfall in one never blocks the others. Percentiles are
//! computed only after all fetchers have settled, because a rank needs the
//! complete cross-bucket distribution.

use crate::domain::error::DomainError;
use crate::domain::ports::market_feed::{MarketFeed, RawMarketObservation};
use crate::domain::values::run_status::RunStatus;
use crate::infrastructure::config::{BucketMappings, MacroSeriesConfig};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const SCHEMA_NAME: &str = "trendintel.signal_report";
pub const SCHEMA_VERSION: u32 = 1;

/// A fetcher returning less than this share of its expected instruments is
/// degraded.
const COVERAGE_FLOOR: f64 = 0.8;
/// Per-fetcher wall-clock budget.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// How many contributors each bucket reports.
const TOP_CONTRIBUTORS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub status: RunStatus,
    pub expected: usize,
    pub fetched: usize,
}

/// Methodology parameters actually used for the run, embedded so a consumer
/// can tell two runs apart without guessing.
#[derive(Debug, Clone, Serialize)]
pub struct Methodology {
    pub window_days: u32,
    pub pms_weighting: &'static str,
    pub css_weighting: &'static str,
    pub transform: &'static str,
}

/// One instrument's share of a bucket's score.
#[derive(Debug, Clone, Serialize)]
pub struct Contributor {
    pub symbol: String,
    pub weight: f64,
    pub change_pct: f64,
    /// Signed: weight x change.
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentCoverage {
    pub instruments_present: usize,
    pub instruments_mapped: usize,
}

/// Per-bucket percentile signals. `None` means no instrument was present —
/// deliberately distinct from a neutral 50.
#[derive(Debug, Clone, Serialize)]
pub struct BucketSignal {
    pub bucket_id: String,
    pub pms: Option<f64>,
    pub pms_coverage: InstrumentCoverage,
    pub pms_contributors: Vec<Contributor>,
    pub css: Option<f64>,
    pub css_coverage: InstrumentCoverage,
    pub css_contributors: Vec<Contributor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroInterpretation {
    RiskOn,
    Neutral,
    RiskOff,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacroComponent {
    pub series_id: String,
    pub weight: f64,
    pub inverted: bool,
    pub z_score: Option<f64>,
    /// Why the component was left out of the composite, when it was.
    pub skip_reason: Option<String>,
}

/// Macro regime scalar in [-1, 1]. Context only: it is never multiplied
/// into a bucket's composite score.
#[derive(Debug, Clone, Serialize)]
pub struct MacroRegimeSignal {
    pub value: f64,
    pub interpretation: MacroInterpretation,
    pub components: Vec<MacroComponent>,
}

/// Self-describing output artifact for one refresh run.
#[derive(Debug, Serialize)]
pub struct SignalReport {
    pub schema_name: &'static str,
    pub schema_version: u32,
    pub run_id: String,
    pub generated_at: chrono::DateTime<Utc>,
    pub as_of: NaiveDate,
    pub methodology: Methodology,
    pub source_health: BTreeMap<String, SourceStatus>,
    pub observations: Vec<RawMarketObservation>,
    pub macro_regime: MacroRegimeSignal,
    pub buckets: Vec<BucketSignal>,
    pub warnings: Vec<String>,
    pub overall_status: RunStatus,
}

pub struct RefreshSignalsUseCase {
    equities: Arc<dyn MarketFeed>,
    tokens: Arc<dyn MarketFeed>,
    macro_feed: Arc<dyn MarketFeed>,
    buckets: BucketMappings,
    macro_series: Vec<MacroSeriesConfig>,
}

impl RefreshSignalsUseCase {
    pub fn new(
        equities: Arc<dyn MarketFeed>,
        tokens: Arc<dyn MarketFeed>,
        macro_feed: Arc<dyn MarketFeed>,
        buckets: BucketMappings,
        macro_series: Vec<MacroSeriesConfig>,
    ) -> Self {
        Self {
            equities,
            tokens,
            macro_feed,
            buckets,
            macro_series,
        }
    }

    pub async fn execute(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> Result<SignalReport, DomainError> {
        let mut warnings = Vec::new();

        // Join barrier: every percentile below needs the full cross-bucket
        // distribution, so nothing is scored until all three settle.
        let (eq, tok, mac) = tokio::join!(
            fetch_bulkheaded(self.equities.as_ref(), as_of, window_days),
            fetch_bulkheaded(self.tokens.as_ref(), as_of, window_days),
            fetch_bulkheaded(self.macro_feed.as_ref(), as_of, window_days),
        );

        let mut source_health = BTreeMap::new();
        let (equity_obs, status) = settle(
            self.equities.name(),
            self.equities.expected_instruments(),
            eq,
            &mut warnings,
        );
        source_health.insert(self.equities.name().to_string(), status);
        let (token_obs, status) = settle(
            self.tokens.name(),
            self.tokens.expected_instruments(),
            tok,
            &mut warnings,
        );
        source_health.insert(self.tokens.name().to_string(), status);
        let (macro_obs, status) = settle(
            self.macro_feed.name(),
            self.macro_feed.expected_instruments(),
            mac,
            &mut warnings,
        );
        source_health.insert(self.macro_feed.name().to_string(), status);

        let buckets = aggregate_buckets(&self.buckets, &equity_obs, &token_obs, window_days);
        let macro_regime = macro_regime(&self.macro_series, &macro_obs);

        for component in &macro_regime.components {
            if let Some(reason) = &component.skip_reason {
                warnings.push(format!(
                    "macro component '{}' skipped: {reason}",
                    component.series_id
                ));
            }
        }

        let overall_status = source_health
            .values()
            .fold(RunStatus::Ok, |acc, s| acc.worst(s.status));

        let mut observations = Vec::new();
        observations.extend(equity_obs);
        observations.extend(token_obs);
        observations.extend(macro_obs);
        observations.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        Ok(SignalReport {
            schema_name: SCHEMA_NAME,
            schema_version: SCHEMA_VERSION,
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            as_of,
            methodology: Methodology {
                window_days,
                pms_weighting: "equal",
                css_weighting: "confidence",
                transform: "percentile_rank",
            },
            source_health,
            observations,
            macro_regime,
            buckets,
            warnings,
            overall_status,
        })
    }
}

/// Run one fetcher under its own timeout. Errors and timeouts become values
/// here so the join above can never be poisoned by a sibling.
async fn fetch_bulkheaded(
    feed: &dyn MarketFeed,
    as_of: NaiveDate,
    window_days: u32,
) -> Result<Vec<RawMarketObservation>, DomainError> {
    match tokio::time::timeout(FETCH_TIMEOUT, feed.fetch(as_of, window_days)).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::SourceUnavailable(format!(
            "{} timed out after {}s",
            feed.name(),
            FETCH_TIMEOUT.as_secs()
        ))),
    }
}

/// Convert a fetch outcome into observations plus a health entry. Failures
/// and shortfalls degrade the source, with the gap recorded in warnings;
/// they never abort the run.
fn settle(
    name: &str,
    expected: usize,
    outcome: Result<Vec<RawMarketObservation>, DomainError>,
    warnings: &mut Vec<String>,
) -> (Vec<RawMarketObservation>, SourceStatus) {
    match outcome {
        Ok(observations) => {
            let fetched = observations.len();
            let complete = expected == 0 || fetched as f64 >= COVERAGE_FLOOR * expected as f64;
            let status = if complete {
                RunStatus::Ok
            } else {
                warnings.push(format!(
                    "source '{name}' returned {fetched}/{expected} expected instruments"
                ));
                RunStatus::Degraded
            };
            (
                observations,
                SourceStatus {
                    status,
                    expected,
                    fetched,
                },
            )
        }
        Err(e) => {
            warnings.push(format!("source '{name}' unavailable: {e}"));
            (
                Vec::new(),
                SourceStatus {
                    status: RunStatus::Degraded,
                    expected,
                    fetched: 0,
                },
            )
        }
    }
}

/// Percentile rank of each value within the run's distribution: the
/// minimum maps to 0, the maximum to 100. A single-value distribution is
/// its own median.
fn percentile_ranks(values: &[(String, f64)]) -> BTreeMap<String, f64> {
    let mut ranks = BTreeMap::new();
    let n = values.len();
    if n == 1 {
        ranks.insert(values[0].0.clone(), 50.0);
        return ranks;
    }
    for (bucket, value) in values {
        let below = values.iter().filter(|(_, v)| v < value).count();
        ranks.insert(bucket.clone(), 100.0 * below as f64 / (n - 1) as f64);
    }
    ranks
}

struct WeightedInstrument {
    symbol: String,
    weight: f64,
    change_pct: f64,
}

/// Top contributors by absolute change, each with its signed contribution.
fn top_contributors(instruments: &[WeightedInstrument]) -> Vec<Contributor> {
    let mut ranked: Vec<&WeightedInstrument> = instruments.iter().collect();
    ranked.sort_by(|a, b| {
        b.change_pct
            .abs()
            .partial_cmp(&a.change_pct.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked
        .into_iter()
        .take(TOP_CONTRIBUTORS)
        .map(|i| Contributor {
            symbol: i.symbol.clone(),
            weight: i.weight,
            change_pct: i.change_pct,
            contribution: i.weight * i.change_pct,
        })
        .collect()
}

/// Compute every bucket's PMS and CSS. Representative values first, then
/// one percentile pass per metric over the buckets that had data at all.
pub(crate) fn aggregate_buckets(
    mappings: &BucketMappings,
    equity_obs: &[RawMarketObservation],
    token_obs: &[RawMarketObservation],
    window_days: u32,
) -> Vec<BucketSignal> {
    let mut bucket_ids: Vec<String> = mappings
        .tickers
        .iter()
        .map(|t| t.bucket.clone())
        .chain(mappings.tokens.iter().map(|t| t.primary_bucket.clone()))
        .chain(
            mappings
                .tokens
                .iter()
                .filter_map(|t| t.secondary_bucket.clone()),
        )
        .collect();
    bucket_ids.sort();
    bucket_ids.dedup();

    let find_equity = |symbol: &str| equity_obs.iter().find(|o| o.symbol == symbol);
    let find_token = |symbol: &str| token_obs.iter().find(|o| o.symbol == symbol);

    struct BucketAccum {
        pms_value: Option<f64>,
        pms_coverage: InstrumentCoverage,
        pms_instruments: Vec<WeightedInstrument>,
        css_value: Option<f64>,
        css_coverage: InstrumentCoverage,
        css_instruments: Vec<WeightedInstrument>,
    }

    let mut accums: BTreeMap<String, BucketAccum> = BTreeMap::new();

    for bucket_id in &bucket_ids {
        // PMS: equal-weighted mean of mapped equities' window change.
        let mapped_tickers: Vec<&str> = mappings
            .tickers
            .iter()
            .filter(|t| &t.bucket == bucket_id)
            .map(|t| t.symbol.as_str())
            .collect();
        let present: Vec<(&str, f64)> = mapped_tickers
            .iter()
            .filter_map(|symbol| {
                find_equity(symbol)
                    .and_then(|o| o.change_for_window(window_days))
                    .map(|c| (*symbol, c))
            })
            .collect();
        let pms_value = if present.is_empty() {
            None
        } else {
            Some(present.iter().map(|(_, c)| c).sum::<f64>() / present.len() as f64)
        };
        let pms_instruments: Vec<WeightedInstrument> = present
            .iter()
            .map(|(symbol, change)| WeightedInstrument {
                symbol: symbol.to_string(),
                weight: 1.0 / present.len() as f64,
                change_pct: *change,
            })
            .collect();
        let pms_coverage = InstrumentCoverage {
            instruments_present: present.len(),
            instruments_mapped: mapped_tickers.len(),
        };

        // CSS: confidence-weighted mean of mapped tokens; a secondary
        // assignment contributes at half its registered confidence.
        let mapped_tokens: Vec<(&str, f64)> = mappings
            .tokens
            .iter()
            .filter_map(|t| {
                if t.primary_bucket == *bucket_id {
                    Some((t.symbol.as_str(), t.confidence))
                } else if t.secondary_bucket.as_deref() == Some(bucket_id.as_str()) {
                    Some((t.symbol.as_str(), t.confidence / 2.0))
                } else {
                    None
                }
            })
            .collect();
        let token_present: Vec<(&str, f64, f64)> = mapped_tokens
            .iter()
            .filter_map(|(symbol, confidence)| {
                find_token(symbol)
                    .and_then(|o| o.change_for_window(window_days))
                    .map(|c| (*symbol, *confidence, c))
            })
            .collect();
        let confidence_total: f64 = token_present.iter().map(|(_, w, _)| w).sum();
        let css_value = if token_present.is_empty() || confidence_total <= 0.0 {
            None
        } else {
            Some(
                token_present
                    .iter()
                    .map(|(_, w, c)| w * c)
                    .sum::<f64>()
                    / confidence_total,
            )
        };
        let css_instruments: Vec<WeightedInstrument> = token_present
            .iter()
            .map(|(symbol, confidence, change)| WeightedInstrument {
                symbol: symbol.to_string(),
                weight: confidence / confidence_total.max(f64::EPSILON),
                change_pct: *change,
            })
            .collect();
        let css_coverage = InstrumentCoverage {
            instruments_present: token_present.len(),
            instruments_mapped: mapped_tokens.len(),
        };

        accums.insert(
            bucket_id.clone(),
            BucketAccum {
                pms_value,
                pms_coverage,
                pms_instruments,
                css_value,
                css_coverage,
                css_instruments,
            },
        );
    }

    let pms_values: Vec<(String, f64)> = accums
        .iter()
        .filter_map(|(id, a)| a.pms_value.map(|v| (id.clone(), v)))
        .collect();
    let css_values: Vec<(String, f64)> = accums
        .iter()
        .filter_map(|(id, a)| a.css_value.map(|v| (id.clone(), v)))
        .collect();
    let pms_ranks = percentile_ranks(&pms_values);
    let css_ranks = percentile_ranks(&css_values);

    accums
        .into_iter()
        .map(|(bucket_id, accum)| BucketSignal {
            pms: pms_ranks.get(&bucket_id).copied(),
            css: css_ranks.get(&bucket_id).copied(),
            pms_contributors: top_contributors(&accum.pms_instruments),
            css_contributors: top_contributors(&accum.css_instruments),
            pms_coverage: accum.pms_coverage,
            css_coverage: accum.css_coverage,
            bucket_id,
        })
        .collect()
}

/// Weighted z-score composite over the available components only, clipped
/// to [-1, 1]. Missing components are skipped, never zero-filled.
pub(crate) fn macro_regime(
    series: &[MacroSeriesConfig],
    observations: &[RawMarketObservation],
) -> MacroRegimeSignal {
    let mut components = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for config in series {
        let observation = observations.iter().find(|o| o.symbol == config.series_id);
        let (z_score, skip_reason) = match observation {
            None => (None, Some("not fetched".to_string())),
            Some(o) => match o.z_score {
                None => (None, Some("insufficient history for z-score".to_string())),
                Some(z) => (Some(z), None),
            },
        };
        if let Some(z) = z_score {
            let adjusted = if config.invert { -z } else { z };
            weighted_sum += config.weight * adjusted;
            weight_total += config.weight;
        }
        components.push(MacroComponent {
            series_id: config.series_id.clone(),
            weight: config.weight,
            inverted: config.invert,
            z_score,
            skip_reason,
        });
    }

    let value = if weight_total > 0.0 {
        (weighted_sum / weight_total).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let interpretation = if value >= 0.25 {
        MacroInterpretation::RiskOn
    } else if value <= -0.25 {
        MacroInterpretation::RiskOff
    } else {
        MacroInterpretation::Neutral
    };

    MacroRegimeSignal {
        value,
        interpretation,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{TickerMapping, TokenMapping};
    use chrono::Utc;

    fn observation(symbol: &str, change_7d: f64) -> RawMarketObservation {
        RawMarketObservation {
            symbol: symbol.into(),
            observed_at: Utc::now(),
            value: 100.0,
            change_1d_pct: None,
            change_7d_pct: Some(change_7d),
            change_30d_pct: None,
            volume_ratio: None,
            z_score: None,
        }
    }

    fn mappings() -> BucketMappings {
        BucketMappings {
            tickers: vec![
                TickerMapping { symbol: "AAA".into(), bucket: "agents".into() },
                TickerMapping { symbol: "BBB".into(), bucket: "infra".into() },
                TickerMapping { symbol: "CCC".into(), bucket: "robotics".into() },
            ],
            tokens: vec![],
        }
    }

    #[test]
    fn test_extreme_bucket_gets_extreme_percentile() {
        let observations = vec![
            observation("AAA", 25.0),
            observation("BBB", 5.0),
            observation("CCC", -10.0),
        ];
        let buckets = aggregate_buckets(&mappings(), &observations, &[], 7);
        let by_id: BTreeMap<&str, &BucketSignal> =
            buckets.iter().map(|b| (b.bucket_id.as_str(), b)).collect();
        assert_eq!(by_id["agents"].pms, Some(100.0));
        assert_eq!(by_id["robotics"].pms, Some(0.0));
        assert_eq!(by_id["infra"].pms, Some(50.0));
    }

    #[test]
    fn test_empty_bucket_is_null_not_fifty() {
        // CCC never reports, so robotics has zero present instruments.
        let observations = vec![observation("AAA", 25.0), observation("BBB", 5.0)];
        let buckets = aggregate_buckets(&mappings(), &observations, &[], 7);
        let robotics = buckets.iter().find(|b| b.bucket_id == "robotics").unwrap();
        assert_eq!(robotics.pms, None);
        assert_eq!(robotics.pms_coverage.instruments_present, 0);
        assert_eq!(robotics.pms_coverage.instruments_mapped, 1);
    }

    #[test]
    fn test_secondary_token_contributes_at_half_confidence() {
        let mappings = BucketMappings {
            tickers: vec![],
            tokens: vec![
                TokenMapping {
                    symbol: "primecoin".into(),
                    primary_bucket: "agents".into(),
                    secondary_bucket: None,
                    confidence: 0.8,
                },
                TokenMapping {
                    symbol: "sidecoin".into(),
                    primary_bucket: "infra".into(),
                    secondary_bucket: Some("agents".into()),
                    confidence: 0.8,
                },
            ],
        };
        let tokens = vec![observation("primecoin", 10.0), observation("sidecoin", -20.0)];
        let buckets = aggregate_buckets(&mappings, &[], &tokens, 7);
        let agents = buckets.iter().find(|b| b.bucket_id == "agents").unwrap();
        // Representative: (0.8*10 + 0.4*-20) / 1.2 = 0 -> middle of the
        // two-bucket distribution vs infra's -20.
        assert_eq!(agents.css, Some(100.0));
        assert_eq!(agents.css_coverage.instruments_present, 2);
    }

    #[test]
    fn test_contributors_ranked_by_absolute_change() {
        let observations = vec![
            observation("AAA", 2.0),
            observation("BBB", -30.0),
            observation("CCC", 10.0),
        ];
        let mappings = BucketMappings {
            tickers: vec![
                TickerMapping { symbol: "AAA".into(), bucket: "one".into() },
                TickerMapping { symbol: "BBB".into(), bucket: "one".into() },
                TickerMapping { symbol: "CCC".into(), bucket: "one".into() },
            ],
            tokens: vec![],
        };
        let buckets = aggregate_buckets(&mappings, &observations, &[], 7);
        let contributors = &buckets[0].pms_contributors;
        assert_eq!(contributors[0].symbol, "BBB");
        assert!(contributors[0].contribution < 0.0);
        assert_eq!(contributors[1].symbol, "CCC");
    }

    fn macro_obs(series: &str, z: Option<f64>) -> RawMarketObservation {
        RawMarketObservation {
            symbol: series.into(),
            observed_at: Utc::now(),
            value: 1.0,
            change_1d_pct: None,
            change_7d_pct: None,
            change_30d_pct: None,
            volume_ratio: None,
            z_score: z,
        }
    }

    #[test]
    fn test_single_neutral_indicator_yields_zero() {
        let series = vec![MacroSeriesConfig {
            series_id: "VIX".into(),
            weight: 1.0,
            invert: true,
        }];
        let regime = macro_regime(&series, &[macro_obs("VIX", Some(0.0))]);
        assert_eq!(regime.value, 0.0);
        assert_eq!(regime.interpretation, MacroInterpretation::Neutral);
    }

    #[test]
    fn test_inverted_series_flips_sign() {
        let series = vec![MacroSeriesConfig {
            series_id: "VIX".into(),
            weight: 1.0,
            invert: true,
        }];
        let regime = macro_regime(&series, &[macro_obs("VIX", Some(0.5))]);
        assert!(regime.value < 0.0);
    }

    #[test]
    fn test_mrs_is_clipped() {
        let series = vec![MacroSeriesConfig {
            series_id: "SPREAD".into(),
            weight: 1.0,
            invert: false,
        }];
        let regime = macro_regime(&series, &[macro_obs("SPREAD", Some(4.0))]);
        assert_eq!(regime.value, 1.0);
    }

    #[test]
    fn test_missing_component_skipped_not_zero_filled() {
        let series = vec![
            MacroSeriesConfig { series_id: "A".into(), weight: 1.0, invert: false },
            MacroSeriesConfig { series_id: "B".into(), weight: 1.0, invert: false },
        ];
        // Only A is fetched, at z = 1.0. Zero-filling B would halve the
        // composite; skipping keeps it at 1.0.
        let regime = macro_regime(&series, &[macro_obs("A", Some(1.0))]);
        assert_eq!(regime.value, 1.0);
        let skipped = regime.components.iter().find(|c| c.series_id == "B").unwrap();
        assert!(skipped.skip_reason.is_some());
    }
}
