use crate::domain::values::data_health::DataHealth;
use crate::domain::values::source_category::SourceCategory;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record produced by a source: an identifier plus an untyped payload.
///
/// Upstream payload shapes drift independently, so fields are read lazily
/// with explicit presence checks rather than deserialized into a fixed
/// struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    /// What the record is about: a repo path, a handle, a ticker, a term.
    pub identifier: String,
    /// When the underlying observation was made (not when it was fetched).
    pub observed_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl SignalRecord {
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn field_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(|v| v.as_f64())
    }

    pub fn field_u64(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(|v| v.as_u64())
    }

    pub fn field_bool(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(|v| v.as_bool())
    }
}

/// All records one category accumulated for a snapshot date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub schema_version: u32,
    pub records: Vec<SignalRecord>,
}

/// Health of one contributing source within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub category: SourceCategory,
    pub status: DataHealth,
}

/// A dated, immutable consolidated capture of all source outputs — the
/// single source of truth for a day's analysis.
///
/// Never contains a record observed after its own date; `get_snapshot`
/// enforces the same bound a second time at read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub date: NaiveDate,
    pub built_at: DateTime<Utc>,
    pub categories: BTreeMap<SourceCategory, CategoryPayload>,
    /// Source name -> health, for every configured source.
    pub health: BTreeMap<String, SourceHealth>,
}

impl SourceSnapshot {
    /// A category is usable when it has records and at least one of its
    /// sources is fresh. Stale-only or empty categories count as configured
    /// but contribute nothing to validation coverage.
    pub fn category_usable(&self, category: SourceCategory) -> bool {
        let has_records = self
            .categories
            .get(&category)
            .map(|p| !p.records.is_empty())
            .unwrap_or(false);
        let has_fresh_source = self
            .health
            .values()
            .any(|h| h.category == category && h.status == DataHealth::Available);
        has_records && has_fresh_source
    }

    pub fn records_in(&self, category: SourceCategory) -> &[SignalRecord] {
        self.categories
            .get(&category)
            .map(|p| p.records.as_slice())
            .unwrap_or(&[])
    }

    /// Sources with a given health status, sorted by name.
    pub fn sources_with(&self, status: DataHealth) -> Vec<String> {
        self.health
            .iter()
            .filter(|(_, h)| h.status == status)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Raw output from one source, as handed to the snapshot builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSourceOutput {
    pub source: String,
    pub category: SourceCategory,
    pub schema_version: u32,
    /// When the source produced this output (freshness is judged off this).
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<SignalRecord>,
}
