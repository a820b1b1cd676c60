//! Score conviction for one entity as of one snapshot date.
//!
//! Pulls the entity's evidence out of the snapshot (momentum fields for the
//! growth stage, commercial/safety fields for the risk stage), runs the
//! three-stage synthesis, and appends the result. Evidence extraction uses
//! lazy field-presence checks: upstream payload shapes drift, and an absent
//! field is data, not an error.

use crate::application::conviction::growth::{self, GrowthEvidence};
use crate::application::conviction::risk::{self, PricingModel, RiskEvidence};
use crate::application::conviction::arbiter;
use crate::domain::entities::conviction::ConvictionAssessment;
use crate::domain::entities::snapshot::{SignalRecord, SourceSnapshot};
use crate::domain::error::DomainError;
use crate::domain::ports::assessment_repository::AssessmentRepository;
use crate::domain::ports::snapshot_store::SnapshotStore;
use crate::infrastructure::registry::{matcher, RegistryHandle};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct ScoreConvictionUseCase {
    registry: Arc<RegistryHandle>,
    snapshot_store: Arc<dyn SnapshotStore>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl ScoreConvictionUseCase {
    pub fn new(
        registry: Arc<RegistryHandle>,
        snapshot_store: Arc<dyn SnapshotStore>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            registry,
            snapshot_store,
            assessments,
        }
    }

    /// Score `entity_id` from evidence visible in the snapshot at or before
    /// `date`. The stored assessment for an existing (entity, date) key is
    /// returned unchanged: history is append-only.
    pub fn execute(
        &self,
        entity_id: &str,
        date: NaiveDate,
    ) -> Result<ConvictionAssessment, DomainError> {
        let registry = self.registry.current();
        if registry.get(entity_id).is_none() {
            return Err(DomainError::NotFound(format!("entity: {entity_id}")));
        }
        let snapshot = self.snapshot_store.get_snapshot(date)?;

        let records = entity_records(&registry, entity_id, &snapshot);
        let assessment = score_from_records(entity_id, snapshot.date, &records);
        self.assessments.insert(&assessment)
    }
}

/// Records in the snapshot that resolve to the target entity, in category
/// then stored order.
fn entity_records<'a>(
    registry: &crate::infrastructure::registry::Registry,
    entity_id: &str,
    snapshot: &'a SourceSnapshot,
) -> Vec<&'a SignalRecord> {
    let mut records = Vec::new();
    for (category, payload) in &snapshot.categories {
        for record in &payload.records {
            let context = record
                .payload
                .as_object()
                .map(|m| {
                    m.values()
                        .filter_map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            let resolution = matcher::resolve(registry, &record.identifier, Some(*category), &context);
            if resolution
                .primary
                .map(|p| p.entity_id == entity_id)
                .unwrap_or(false)
            {
                records.push(record);
            }
        }
    }
    records
}

/// Run the three-stage synthesis over extracted evidence. Pure; exposed for
/// the backtest engine, which replays it against historical snapshots.
pub fn score_from_records(
    entity_id: &str,
    analysis_date: NaiveDate,
    records: &[&SignalRecord],
) -> ConvictionAssessment {
    let growth_evidence = extract_growth(records);
    let risk_evidence = extract_risk(records);
    let growth_assessment = growth::assess(&growth_evidence);
    let risk_assessment = risk::assess(&risk_evidence);
    arbiter::synthesize(entity_id, analysis_date, &growth_assessment, &risk_assessment)
}

/// First present value wins, in record order. Category order is fixed by
/// the snapshot's BTreeMap, so extraction is deterministic.
fn first_u64(records: &[&SignalRecord], key: &str) -> Option<u64> {
    records.iter().find_map(|r| r.field_u64(key))
}

fn first_f64(records: &[&SignalRecord], key: &str) -> Option<f64> {
    records.iter().find_map(|r| r.field_f64(key))
}

fn first_bool(records: &[&SignalRecord], key: &str) -> Option<bool> {
    records.iter().find_map(|r| r.field_bool(key))
}

fn first_str(records: &[&SignalRecord], key: &str) -> Option<String> {
    records
        .iter()
        .find_map(|r| r.field_str(key).map(|s| s.to_string()))
}

fn extract_growth(records: &[&SignalRecord]) -> GrowthEvidence {
    let weekly_mentions = records
        .iter()
        .find_map(|r| r.payload.get("weekly_mentions").and_then(|v| v.as_array()))
        .map(|arr| arr.iter().filter_map(|v| v.as_u64()).collect())
        .unwrap_or_default();

    GrowthEvidence {
        stars: first_u64(records, "stars"),
        star_growth_pct_4w: first_f64(records, "star_growth_pct_4w"),
        forks: first_u64(records, "forks"),
        downloads_30d: first_u64(records, "downloads_30d"),
        download_growth_pct_30d: first_f64(records, "download_growth_pct_30d"),
        weekly_mentions,
        social_engagement: first_f64(records, "social_engagement"),
    }
}

fn extract_risk(records: &[&SignalRecord]) -> RiskEvidence {
    RiskEvidence {
        is_open_source: first_bool(records, "is_open_source"),
        has_saas_offering: first_bool(records, "has_saas_offering"),
        license: first_str(records, "license"),
        has_pricing_page: first_bool(records, "has_pricing_page"),
        pricing_model: first_str(records, "pricing_model").and_then(|s| s.parse::<PricingModel>().ok()),
        last_commit_days: first_u64(records, "last_commit_days").map(|d| d as u32),
        last_release_days: first_u64(records, "last_release_days").map(|d| d as u32),
        months_since_funding: first_u64(records, "months_since_funding").map(|m| m as u32),
        funding_total_usd: first_f64(records, "funding_total_usd"),
        paying_customers: first_bool(records, "paying_customers"),
        enterprise_logos: first_u64(records, "enterprise_logos").unwrap_or(0) as u32,
        breaches: first_u64(records, "breaches").unwrap_or(0) as u32,
        lawsuits: first_u64(records, "lawsuits").unwrap_or(0) as u32,
        layoffs: first_u64(records, "layoffs").unwrap_or(0) as u32,
        founder_controversies: first_u64(records, "founder_controversies").unwrap_or(0) as u32,
    }
}
