//! Cross-source signal validation.
//!
//! Given a resolved entity and a snapshot, measures how well independent
//! source categories corroborate the trend. Coverage answers "how much of
//! the configured surface could we even check"; strength answers "how good
//! was what we found." The two are kept separate so "nothing to check"
//! never masquerades as "checked, found nothing."

use crate::domain::entities::resolution::EntityResolution;
use crate::domain::entities::snapshot::{SignalRecord, SourceSnapshot};
use crate::domain::error::DomainError;
use crate::domain::values::data_health::DataHealth;
use crate::domain::values::match_tier::MatchTier;
use crate::domain::values::source_category::SourceCategory;
use crate::infrastructure::registry::{matcher, Registry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strength weighting: source count, category diversity, temporal alignment.
const WEIGHT_SOURCE_COUNT: f64 = 0.4;
const WEIGHT_DIVERSITY: f64 = 0.3;
const WEIGHT_TEMPORAL: f64 = 0.3;

/// Minimum tier weight for a hit to count toward the corroboration gate.
const GATE_STRONG_WEIGHT: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    HighConfidence,
    Validated,
    Unvalidated,
    InsufficientData,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::HighConfidence => write!(f, "high_confidence"),
            ValidationStatus::Validated => write!(f, "validated"),
            ValidationStatus::Unvalidated => write!(f, "unvalidated"),
            ValidationStatus::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// One snapshot record that corroborates the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMatch {
    pub category: SourceCategory,
    pub identifier: String,
    pub tier: MatchTier,
    pub weight: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthFactors {
    pub source_count_factor: f64,
    pub diversity_factor: f64,
    pub temporal_alignment_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub entity_id: String,
    /// Usable categories / configured categories, in [0, 1].
    pub coverage: f64,
    /// Corroboration quality over what was usable, in [0, 1].
    pub strength: f64,
    /// coverage x strength.
    pub validation_score: f64,
    pub status: ValidationStatus,
    pub factors: StrengthFactors,
    pub matches: Vec<SourceMatch>,
    pub tier_distribution: BTreeMap<MatchTier, usize>,
    pub sources_checked: Vec<String>,
    pub sources_missing: Vec<String>,
    pub sources_no_data: Vec<String>,
    pub fail_reasons: Vec<String>,
    /// The downstream corroboration gate: >=2 hits at tier weight >= 0.6,
    /// or one tier-1 hit plus >=2 context-qualified tier-3 hits.
    pub validated: bool,
}

/// Validate a resolved entity against a snapshot.
///
/// Pure over its inputs; re-running with the same (registry version,
/// snapshot) yields an identical result.
pub fn compute_validation(
    registry: &Registry,
    resolution: &EntityResolution,
    snapshot: &SourceSnapshot,
) -> Result<ValidationResult, DomainError> {
    let primary = resolution
        .primary
        .as_ref()
        .ok_or_else(|| DomainError::InvalidInput(format!("unresolved: {}", resolution.raw_name)))?;
    let entity_id = primary.entity_id.clone();

    let configured = SourceCategory::ALL;
    let usable: Vec<SourceCategory> = configured
        .iter()
        .copied()
        .filter(|c| snapshot.category_usable(*c))
        .collect();
    let coverage = usable.len() as f64 / configured.len() as f64;

    let mut matches = Vec::new();
    for category in usable.iter().copied() {
        for record in snapshot.records_in(category) {
            if let Some(m) = match_record(registry, &entity_id, category, record) {
                matches.push(m);
            }
        }
    }

    let mut tier_distribution: BTreeMap<MatchTier, usize> = BTreeMap::new();
    for m in &matches {
        *tier_distribution.entry(m.tier).or_insert(0) += 1;
    }

    let hit_categories: Vec<SourceCategory> = {
        let mut cats: Vec<SourceCategory> = matches.iter().map(|m| m.category).collect();
        cats.sort();
        cats.dedup();
        cats
    };

    let factors = StrengthFactors {
        source_count_factor: source_count_factor(hit_categories.len()),
        diversity_factor: diversity_factor(&hit_categories, configured.len()),
        temporal_alignment_factor: temporal_alignment_factor(&matches, &hit_categories),
    };
    let strength = WEIGHT_SOURCE_COUNT * factors.source_count_factor
        + WEIGHT_DIVERSITY * factors.diversity_factor
        + WEIGHT_TEMPORAL * factors.temporal_alignment_factor;
    let validation_score = coverage * strength;

    let validated = corroboration_gate(&matches);

    let mut fail_reasons = Vec::new();
    if coverage < 0.5 {
        fail_reasons.push(format!(
            "coverage {:.2} below 0.5: only {}/{} categories usable",
            coverage,
            usable.len(),
            configured.len()
        ));
    }
    if hit_categories.len() < 2 {
        fail_reasons.push(format!(
            "corroboration requires >=2 categories, found {}",
            hit_categories.len()
        ));
    }
    if !validated && !matches.is_empty() {
        fail_reasons.push("no hit combination satisfied the corroboration gate".into());
    }

    let status = if coverage < 0.5 {
        ValidationStatus::InsufficientData
    } else if validation_score >= 0.7 {
        ValidationStatus::HighConfidence
    } else if validation_score >= 0.5 {
        ValidationStatus::Validated
    } else {
        ValidationStatus::Unvalidated
    };

    Ok(ValidationResult {
        entity_id,
        coverage,
        strength,
        validation_score,
        status,
        factors,
        matches,
        tier_distribution,
        sources_checked: snapshot.health.keys().cloned().collect(),
        sources_missing: snapshot.sources_with(DataHealth::Missing),
        sources_no_data: snapshot.sources_with(DataHealth::NoData),
        fail_reasons,
        validated,
    })
}

/// Re-resolve a record's identifier through the tiered matcher and keep it
/// when it lands on the target entity. Reusing the matcher means tier-3
/// hits here are exactly the context-qualified ones: an ambiguous term
/// without its keywords never produces a match.
fn match_record(
    registry: &Registry,
    entity_id: &str,
    category: SourceCategory,
    record: &SignalRecord,
) -> Option<SourceMatch> {
    let context = record_context(record);
    let resolution = matcher::resolve(registry, &record.identifier, Some(category), &context);
    let primary = resolution.primary?;
    if primary.entity_id != entity_id {
        return None;
    }
    Some(SourceMatch {
        category,
        identifier: record.identifier.clone(),
        tier: primary.tier,
        weight: primary.tier.weight(),
        observed_at: record.observed_at,
    })
}

/// Concatenated top-level string fields of the payload, used as the
/// matcher's nearby context.
fn record_context(record: &SignalRecord) -> String {
    match record.payload.as_object() {
        Some(map) => map
            .values()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

fn source_count_factor(hit_categories: usize) -> f64 {
    match hit_categories {
        0 => 0.0,
        1 => 0.2,
        2 => 0.5,
        3 => 0.75,
        _ => 1.0,
    }
}

/// One point per distinct category hit, +0.15 when technical and financial
/// corroborate each other, +0.1 when predictive coexists with any other
/// category; normalized by the maximum attainable points.
fn diversity_factor(hit_categories: &[SourceCategory], configured: usize) -> f64 {
    if hit_categories.is_empty() {
        return 0.0;
    }
    let mut points = hit_categories.len() as f64;
    let has = |c: SourceCategory| hit_categories.contains(&c);
    if has(SourceCategory::Technical) && has(SourceCategory::Financial) {
        points += 0.15;
    }
    if has(SourceCategory::Predictive) && hit_categories.len() >= 2 {
        points += 0.1;
    }
    let max_points = configured as f64 + 0.25;
    (points / max_points).min(1.0)
}

/// Alignment of observation times across corroborating categories:
/// same-week 1.0, within two weeks 0.7, further apart 0.4, single-category
/// evidence 0.0.
fn temporal_alignment_factor(matches: &[SourceMatch], hit_categories: &[SourceCategory]) -> f64 {
    if hit_categories.len() < 2 {
        return 0.0;
    }
    let earliest = matches.iter().map(|m| m.observed_at).min();
    let latest = matches.iter().map(|m| m.observed_at).max();
    let (Some(earliest), Some(latest)) = (earliest, latest) else {
        return 0.0;
    };
    let span_days = (latest - earliest).num_days();
    if span_days <= 7 {
        1.0
    } else if span_days <= 14 {
        0.7
    } else {
        0.4
    }
}

/// The boolean gate used downstream. Tier-3-only evidence never passes.
fn corroboration_gate(matches: &[SourceMatch]) -> bool {
    let mut strong: Vec<(&SourceCategory, &str)> = matches
        .iter()
        .filter(|m| m.weight >= GATE_STRONG_WEIGHT)
        .map(|m| (&m.category, m.identifier.as_str()))
        .collect();
    strong.sort();
    strong.dedup();
    if strong.len() >= 2 {
        return true;
    }

    let tier1 = matches.iter().filter(|m| m.tier == MatchTier::Tier1).count();
    let tier3: Vec<&str> = {
        let mut ids: Vec<&str> = matches
            .iter()
            .filter(|m| m.tier == MatchTier::Tier3)
            .map(|m| m.identifier.as_str())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    };
    tier1 >= 1 && tier3.len() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_count_factor_table() {
        assert_eq!(source_count_factor(0), 0.0);
        assert_eq!(source_count_factor(1), 0.2);
        assert_eq!(source_count_factor(2), 0.5);
        assert_eq!(source_count_factor(3), 0.75);
        assert_eq!(source_count_factor(4), 1.0);
        assert_eq!(source_count_factor(9), 1.0);
    }

    #[test]
    fn test_diversity_bonus_for_technical_plus_financial() {
        let base = diversity_factor(&[SourceCategory::Technical, SourceCategory::Social], 4);
        let bonus = diversity_factor(&[SourceCategory::Technical, SourceCategory::Financial], 4);
        assert!(bonus > base);
    }

    #[test]
    fn test_diversity_is_bounded() {
        let all = diversity_factor(&SourceCategory::ALL, 4);
        assert!(all <= 1.0);
        assert!((all - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_alignment_needs_two_categories() {
        let now = Utc::now();
        let matches = vec![SourceMatch {
            category: SourceCategory::Technical,
            identifier: "a".into(),
            tier: MatchTier::Tier1,
            weight: 1.0,
            observed_at: now,
        }];
        assert_eq!(
            temporal_alignment_factor(&matches, &[SourceCategory::Technical]),
            0.0
        );
    }

    #[test]
    fn test_gate_rejects_tier3_only() {
        let now = Utc::now();
        let matches: Vec<SourceMatch> = (0..5)
            .map(|i| SourceMatch {
                category: SourceCategory::Social,
                identifier: format!("mention-{i}"),
                tier: MatchTier::Tier3,
                weight: MatchTier::Tier3.weight(),
                observed_at: now,
            })
            .collect();
        assert!(!corroboration_gate(&matches));
    }

    #[test]
    fn test_gate_accepts_tier1_plus_two_tier3() {
        let now = Utc::now();
        let mut matches = vec![SourceMatch {
            category: SourceCategory::Social,
            identifier: "exact".into(),
            tier: MatchTier::Tier1,
            weight: 1.0,
            observed_at: now,
        }];
        for i in 0..2 {
            matches.push(SourceMatch {
                category: SourceCategory::Technical,
                identifier: format!("sub-{i}"),
                tier: MatchTier::Tier3,
                weight: MatchTier::Tier3.weight(),
                observed_at: now,
            });
        }
        assert!(corroboration_gate(&matches));
    }
}
