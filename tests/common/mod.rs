//! Shared test helpers.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use trendintel::domain::entities::canonical_entity::CanonicalEntity;
use trendintel::domain::entities::snapshot::{RawSourceOutput, SignalRecord};
use trendintel::domain::error::DomainError;
use trendintel::domain::ports::market_feed::{MarketFeed, RawMarketObservation};
use trendintel::domain::values::entity_type::EntityType;
use trendintel::domain::values::source_category::SourceCategory;
use trendintel::infrastructure::config::{
    AmbiguityRules, AmbiguityTerm, AppConfig, BucketMappings, MacroSeriesConfig, SourceConfig,
    TickerMapping, TokenMapping,
};
use trendintel::TrendIntel;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_hms_opt(hour, 0, 0).unwrap(), Utc)
}

pub fn deepseek() -> CanonicalEntity {
    let mut aliases = BTreeSet::new();
    aliases.insert("DeepSeek AI".to_string());
    let mut linked = BTreeMap::new();
    linked.insert("github_org".to_string(), vec!["deepseek-ai".to_string()]);
    linked.insert("hf_namespace".to_string(), vec!["deepseek-ai".to_string()]);
    CanonicalEntity {
        id: "deepseek".into(),
        canonical_name: "DeepSeek".into(),
        entity_type: EntityType::Company,
        aliases,
        linked_assets: linked,
        website: Some("https://deepseek.com".into()),
    }
}

pub fn mistral() -> CanonicalEntity {
    let mut linked = BTreeMap::new();
    linked.insert("github_org".to_string(), vec!["mistralai".to_string()]);
    CanonicalEntity {
        id: "mistral".into(),
        canonical_name: "Mistral".into(),
        entity_type: EntityType::Company,
        aliases: BTreeSet::new(),
        linked_assets: linked,
        website: Some("https://mistral.ai".into()),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        entities: vec![deepseek(), mistral()],
        ambiguity: AmbiguityRules {
            terms: vec![AmbiguityTerm {
                term: "Mistral".into(),
                context_keywords: vec!["llm".into(), "model".into(), "paris".into()],
            }],
            deny_patterns: vec![],
        },
        sources: vec![
            SourceConfig {
                name: "github_trending".into(),
                category: SourceCategory::Technical,
                freshness_hours: 48,
            },
            SourceConfig {
                name: "hn_mentions".into(),
                category: SourceCategory::Social,
                freshness_hours: 48,
            },
            SourceConfig {
                name: "funding_tracker".into(),
                category: SourceCategory::Financial,
                freshness_hours: 168,
            },
            SourceConfig {
                name: "forecast_markets".into(),
                category: SourceCategory::Predictive,
                freshness_hours: 72,
            },
        ],
        buckets: BucketMappings {
            tickers: vec![
                TickerMapping { symbol: "AAA".into(), bucket: "agents".into() },
                TickerMapping { symbol: "BBB".into(), bucket: "infra".into() },
                TickerMapping { symbol: "QQQX".into(), bucket: "quantum".into() },
            ],
            tokens: vec![
                TokenMapping {
                    symbol: "agentcoin".into(),
                    primary_bucket: "agents".into(),
                    secondary_bucket: None,
                    confidence: 0.9,
                },
                TokenMapping {
                    symbol: "infracoin".into(),
                    primary_bucket: "infra".into(),
                    secondary_bucket: Some("agents".into()),
                    confidence: 0.6,
                },
            ],
        },
        macro_series: vec![
            MacroSeriesConfig { series_id: "VIXCLS".into(), weight: 1.0, invert: true },
            MacroSeriesConfig { series_id: "T10Y2Y".into(), weight: 0.5, invert: false },
        ],
        ground_truth: vec![],
    }
}

/// A feed returning canned observations, with an independently declared
/// expected-instrument count so shortfalls can be staged.
pub struct FakeFeed {
    pub feed_name: &'static str,
    pub expected: usize,
    pub observations: Vec<RawMarketObservation>,
    pub fail: bool,
}

impl FakeFeed {
    pub fn new(feed_name: &'static str, observations: Vec<RawMarketObservation>) -> Self {
        let expected = observations.len();
        Self {
            feed_name,
            expected,
            observations,
            fail: false,
        }
    }

    pub fn empty(feed_name: &'static str) -> Self {
        Self {
            feed_name,
            expected: 0,
            observations: vec![],
            fail: false,
        }
    }
}

#[async_trait]
impl MarketFeed for FakeFeed {
    fn name(&self) -> &str {
        self.feed_name
    }

    fn expected_instruments(&self) -> usize {
        self.expected
    }

    async fn fetch(
        &self,
        _as_of: NaiveDate,
        _window_days: u32,
    ) -> Result<Vec<RawMarketObservation>, DomainError> {
        if self.fail {
            return Err(DomainError::SourceUnavailable(format!(
                "{} offline",
                self.feed_name
            )));
        }
        Ok(self.observations.clone())
    }
}

pub fn observation(symbol: &str, change_7d: f64) -> RawMarketObservation {
    RawMarketObservation {
        symbol: symbol.into(),
        observed_at: Utc::now(),
        value: 100.0,
        change_1d_pct: Some(change_7d / 7.0),
        change_7d_pct: Some(change_7d),
        change_30d_pct: Some(change_7d * 3.0),
        volume_ratio: Some(1.0),
        z_score: None,
    }
}

pub fn macro_observation(series: &str, z: Option<f64>) -> RawMarketObservation {
    RawMarketObservation {
        symbol: series.into(),
        observed_at: Utc::now(),
        value: 20.0,
        change_1d_pct: None,
        change_7d_pct: None,
        change_30d_pct: None,
        volume_ratio: None,
        z_score: z,
    }
}

pub fn setup() -> TrendIntel {
    setup_with(test_config())
}

pub fn setup_with(config: AppConfig) -> TrendIntel {
    setup_with_feeds(
        config,
        FakeFeed::empty("equities"),
        FakeFeed::empty("tokens"),
        FakeFeed::empty("macro"),
    )
}

pub fn setup_with_feeds(
    config: AppConfig,
    equities: FakeFeed,
    tokens: FakeFeed,
    macro_feed: FakeFeed,
) -> TrendIntel {
    TrendIntel::with_providers(
        ":memory:",
        config,
        Arc::new(equities),
        Arc::new(tokens),
        Arc::new(macro_feed),
    )
    .unwrap()
}

pub fn record(identifier: &str, observed_at: DateTime<Utc>, payload: serde_json::Value) -> SignalRecord {
    SignalRecord {
        identifier: identifier.into(),
        observed_at,
        payload,
    }
}

pub fn output(
    source: &str,
    category: SourceCategory,
    fetched_at: DateTime<Utc>,
    records: Vec<SignalRecord>,
) -> RawSourceOutput {
    RawSourceOutput {
        source: source.into(),
        category,
        schema_version: 1,
        fetched_at,
        records,
    }
}

/// A four-category snapshot input where every source is fresh for `date`
/// and DeepSeek is corroborated by technical + social evidence.
pub fn scenario_outputs(date: NaiveDate) -> Vec<RawSourceOutput> {
    vec![
        output(
            "github_trending",
            SourceCategory::Technical,
            at(date, 8),
            vec![record(
                "deepseek-ai/DeepSeek-V3",
                at(date, 6),
                serde_json::json!({
                    "stars": 24000,
                    "star_growth_pct_4w": 60.0,
                    "weekly_mentions": [10, 25, 70],
                    "is_open_source": true,
                    "license": "MIT",
                    "last_commit_days": 3,
                }),
            )],
        ),
        output(
            "hn_mentions",
            SourceCategory::Social,
            at(date, 9),
            vec![record(
                "DeepSeek",
                at(date, 7),
                serde_json::json!({ "social_engagement": 85.0 }),
            )],
        ),
        output(
            "funding_tracker",
            SourceCategory::Financial,
            at(date, 10),
            vec![record(
                "NVDA",
                at(date, 5),
                serde_json::json!({ "headline": "chip demand" }),
            )],
        ),
        output(
            "forecast_markets",
            SourceCategory::Predictive,
            at(date, 11),
            vec![record(
                "ai-breakthrough-2025",
                at(date, 4),
                serde_json::json!({ "probability": 0.4 }),
            )],
        ),
    ]
}
