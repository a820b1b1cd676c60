//! JSON configuration loading.
//!
//! Everything here is versioned input: the entity registry, ambiguity rules,
//! source map, bucket mappings, macro series, and the ground-truth breakout
//! registry. A malformed entry is a fatal `DomainError::Config` raised at
//! load time, before any fetch or scoring runs.

use crate::domain::entities::canonical_entity::CanonicalEntity;
use crate::domain::entities::ground_truth::GroundTruthEvent;
use crate::domain::error::DomainError;
use crate::domain::values::source_category::SourceCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A term that is only a valid entity mention when qualifying context is
/// nearby. "ray" alone is noise; "ray" next to "distributed" or "anyscale"
/// is a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguityTerm {
    pub term: String,
    pub context_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbiguityRules {
    #[serde(default)]
    pub terms: Vec<AmbiguityTerm>,
    /// Raw names matching any of these substrings are never resolvable.
    #[serde(default)]
    pub deny_patterns: Vec<String>,
}

/// One configured external source and the category it feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub category: SourceCategory,
    /// Output older than this, relative to the snapshot date, is stale.
    pub freshness_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerMapping {
    pub symbol: String,
    pub bucket: String,
}

/// Token-to-bucket mapping. A token assigned as secondary to a bucket
/// contributes at half its registered confidence there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMapping {
    pub symbol: String,
    pub primary_bucket: String,
    #[serde(default)]
    pub secondary_bucket: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketMappings {
    #[serde(default)]
    pub tickers: Vec<TickerMapping>,
    #[serde(default)]
    pub tokens: Vec<TokenMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroSeriesConfig {
    pub series_id: String,
    pub weight: f64,
    /// Series that are "bad when high" (volatility, unemployment) flip sign.
    #[serde(default)]
    pub invert: bool,
}

/// Everything the system reads from disk, bundled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub entities: Vec<CanonicalEntity>,
    #[serde(default)]
    pub ambiguity: AmbiguityRules,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub buckets: BucketMappings,
    #[serde(default)]
    pub macro_series: Vec<MacroSeriesConfig>,
    #[serde(default)]
    pub ground_truth: Vec<GroundTruthEvent>,
}

impl AppConfig {
    /// Load all config files from a directory and validate them.
    ///
    /// Files: registry.json, ambiguity.json, sources.json, buckets.json,
    /// macro.json, ground_truth.json. Missing ambiguity/ground-truth files
    /// default to empty; the registry and sources files are required.
    pub fn load(dir: &Path) -> Result<Self, DomainError> {
        let config = AppConfig {
            entities: read_json(&dir.join("registry.json"))?,
            ambiguity: read_json_or_default(&dir.join("ambiguity.json"))?,
            sources: read_json(&dir.join("sources.json"))?,
            buckets: read_json_or_default(&dir.join("buckets.json"))?,
            macro_series: read_json_or_default(&dir.join("macro.json"))?,
            ground_truth: read_json_or_default(&dir.join("ground_truth.json"))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for entity in &self.entities {
            if entity.id.trim().is_empty() {
                return Err(DomainError::Config("registry entity with empty id".into()));
            }
            if entity.canonical_name.trim().is_empty() {
                return Err(DomainError::Config(format!(
                    "registry entity '{}' has empty canonical_name",
                    entity.id
                )));
            }
        }
        for source in &self.sources {
            if source.freshness_hours <= 0 {
                return Err(DomainError::Config(format!(
                    "source '{}' has non-positive freshness_hours",
                    source.name
                )));
            }
        }
        for token in &self.buckets.tokens {
            if !(0.0..=1.0).contains(&token.confidence) || token.confidence == 0.0 {
                return Err(DomainError::Config(format!(
                    "token '{}' confidence must be in (0, 1], got {}",
                    token.symbol, token.confidence
                )));
            }
        }
        for series in &self.macro_series {
            if series.weight <= 0.0 {
                return Err(DomainError::Config(format!(
                    "macro series '{}' has non-positive weight",
                    series.series_id
                )));
            }
        }
        Ok(())
    }

    pub fn source_named(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DomainError::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| DomainError::Config(format!("malformed {}: {e}", path.display())))
}

fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(
    path: &Path,
) -> Result<T, DomainError> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}
