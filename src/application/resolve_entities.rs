//! Resolve + validate every entity mentioned in a snapshot.

use crate::application::validation::{self, ValidationResult, ValidationStatus};
use crate::domain::entities::resolution::EntityResolution;
use crate::domain::error::DomainError;
use crate::domain::ports::snapshot_store::SnapshotStore;
use crate::domain::values::run_status::RunStatus;
use crate::domain::values::source_category::SourceCategory;
use crate::infrastructure::registry::{matcher, RegistryHandle};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entity's resolution and its cross-source validation.
#[derive(Debug, Clone, Serialize)]
pub struct EntityValidation {
    pub resolution: EntityResolution,
    pub validation: ValidationResult,
}

/// Result of resolving and validating one snapshot.
#[derive(Debug, Serialize)]
pub struct ResolutionScan {
    pub snapshot_date: NaiveDate,
    pub registry_version: u64,
    pub mentions_seen: usize,
    pub entities: Vec<EntityValidation>,
    /// Raw mentions nothing in the registry could claim.
    pub unresolved: Vec<String>,
    pub warnings: Vec<String>,
    pub overall_status: RunStatus,
}

pub struct ResolveEntitiesUseCase {
    registry: Arc<RegistryHandle>,
    snapshot_store: Arc<dyn SnapshotStore>,
}

impl ResolveEntitiesUseCase {
    pub fn new(registry: Arc<RegistryHandle>, snapshot_store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            registry,
            snapshot_store,
        }
    }

    /// Resolve every raw mention in the snapshot at or before `date`,
    /// validate each resolved entity, and report soft failures as warnings.
    ///
    /// Ambiguity rejections and insufficient-data validations never abort
    /// the scan; they surface in `warnings` and in per-entity flags.
    pub fn execute(&self, date: NaiveDate) -> Result<ResolutionScan, DomainError> {
        let registry = self.registry.current();
        let snapshot = self.snapshot_store.get_snapshot(date)?;

        // Every record identifier is a candidate mention. Dedup while
        // remembering which category offered it first (category order is
        // the BTreeMap's, so reruns agree).
        let mut mentions: BTreeMap<String, SourceCategory> = BTreeMap::new();
        for (category, payload) in &snapshot.categories {
            for record in &payload.records {
                mentions
                    .entry(record.identifier.clone())
                    .or_insert(*category);
            }
        }
        let mentions_seen = mentions.len();

        let mut warnings = Vec::new();
        let mut unresolved = Vec::new();
        // Best resolution per entity: highest confidence, then raw name.
        let mut by_entity: BTreeMap<String, EntityResolution> = BTreeMap::new();

        for (raw_name, category) in &mentions {
            let resolution = matcher::resolve(&registry, raw_name, Some(*category), "");
            for flag in &resolution.ambiguity_flags {
                warnings.push(format!("'{raw_name}' excluded: {flag}"));
            }
            match &resolution.primary {
                None => unresolved.push(raw_name.clone()),
                Some(primary) => {
                    let entry = by_entity.entry(primary.entity_id.clone());
                    use std::collections::btree_map::Entry;
                    match entry {
                        Entry::Vacant(v) => {
                            v.insert(resolution);
                        }
                        Entry::Occupied(mut o) => {
                            if resolution.confidence > o.get().confidence {
                                o.insert(resolution);
                            }
                        }
                    }
                }
            }
        }

        let mut entities = Vec::new();
        for resolution in by_entity.into_values() {
            let validation = validation::compute_validation(&registry, &resolution, &snapshot)?;
            if validation.status == ValidationStatus::InsufficientData {
                warnings.push(format!(
                    "'{}' tagged insufficient_data: coverage {:.2}",
                    validation.entity_id, validation.coverage
                ));
            }
            entities.push(EntityValidation {
                resolution,
                validation,
            });
        }

        // Strongest validation first; entity id settles ties.
        entities.sort_by(|a, b| {
            b.validation
                .validation_score
                .partial_cmp(&a.validation.validation_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.validation.entity_id.cmp(&b.validation.entity_id))
        });

        let overall_status = if warnings.is_empty() {
            RunStatus::Ok
        } else {
            RunStatus::Degraded
        };

        Ok(ResolutionScan {
            snapshot_date: snapshot.date,
            registry_version: registry.version(),
            mentions_seen,
            entities,
            unresolved,
            warnings,
            overall_status,
        })
    }

    /// Resolve one raw name with explicit context, without touching a
    /// snapshot. Used by the CLI and by callers embedding the matcher.
    pub fn resolve_name(
        &self,
        raw_name: &str,
        source_category: Option<SourceCategory>,
        context: &str,
    ) -> EntityResolution {
        let registry = self.registry.current();
        matcher::resolve(&registry, raw_name, source_category, context)
    }
}
