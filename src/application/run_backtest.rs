//! Backtest engine and scorecard generator.
//!
//! Replays resolution, validation, and conviction scoring against the
//! snapshot visible as of the prediction date, ranks the top-k entities,
//! and scores those predictions against the curated ground-truth registry.
//! The registry enters only at scoring: predictions are produced by genuine
//! replay, never derived from the ground truth, so precision and recall
//! measure something real.

use crate::application::score_conviction::score_from_records;
use crate::application::validation::{self, ValidationResult};
use crate::domain::entities::ground_truth::GroundTruthEvent;
use crate::domain::entities::snapshot::{SignalRecord, SourceSnapshot};
use crate::domain::error::DomainError;
use crate::domain::ports::snapshot_store::SnapshotStore;
use crate::domain::values::recommendation::Recommendation;
use crate::infrastructure::registry::{matcher, Registry, RegistryHandle};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One ranked prediction from the replay.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub entity_id: String,
    pub conviction_score: f64,
    pub validation_score: f64,
    pub validated: bool,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionOutcome {
    Hit,
    FalsePositive,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredPrediction {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub outcome: PredictionOutcome,
    /// Weeks between prediction and breakout; present only for hits with a
    /// positive lead.
    pub lead_time_weeks: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BacktestRun {
    pub prediction_date: NaiveDate,
    pub validation_date: NaiveDate,
    pub top_k: usize,
    pub snapshot_date: NaiveDate,
    pub candidates_considered: usize,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Serialize)]
pub struct Scorecard {
    pub prediction_date: NaiveDate,
    pub validation_date: NaiveDate,
    pub top_k: usize,
    pub outcomes: Vec<ScoredPrediction>,
    /// Qualifying ground-truth entities the replay never surfaced.
    pub misses: Vec<String>,
    pub hits: usize,
    pub false_positives: usize,
    pub precision_at_k: f64,
    pub recall: f64,
    pub avg_lead_time_weeks: Option<f64>,
    pub miss_rate: f64,
}

pub struct BacktestUseCase {
    registry: Arc<RegistryHandle>,
    snapshot_store: Arc<dyn SnapshotStore>,
    ground_truth: Vec<GroundTruthEvent>,
}

impl BacktestUseCase {
    pub fn new(
        registry: Arc<RegistryHandle>,
        snapshot_store: Arc<dyn SnapshotStore>,
        ground_truth: Vec<GroundTruthEvent>,
    ) -> Self {
        Self {
            registry,
            snapshot_store,
            ground_truth,
        }
    }

    pub fn execute(
        &self,
        prediction_date: NaiveDate,
        validation_date: NaiveDate,
        top_k: usize,
    ) -> Result<Scorecard, DomainError> {
        if validation_date < prediction_date {
            return Err(DomainError::InvalidInput(
                "validation_date precedes prediction_date".into(),
            ));
        }
        let run = self.run_backtest(prediction_date, validation_date, top_k)?;
        Ok(generate_scorecard(&run, &self.ground_truth))
    }

    /// Rank top-k entities using only data visible as of `prediction_date`.
    /// The snapshot store's leakage guard is what makes "visible" honest.
    pub fn run_backtest(
        &self,
        prediction_date: NaiveDate,
        validation_date: NaiveDate,
        top_k: usize,
    ) -> Result<BacktestRun, DomainError> {
        let registry = self.registry.current();
        let snapshot = self.snapshot_store.get_snapshot(prediction_date)?;

        let candidates = replay_candidates(&registry, &snapshot, prediction_date);
        let candidates_considered = candidates.len();

        let mut predictions: Vec<Prediction> = candidates
            .into_iter()
            .map(|(entity_id, validation, conviction)| Prediction {
                entity_id,
                conviction_score: conviction.0,
                validation_score: validation.validation_score,
                validated: validation.validated,
                recommendation: conviction.1,
            })
            .collect();

        predictions.sort_by(|a, b| {
            b.conviction_score
                .partial_cmp(&a.conviction_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        predictions.truncate(top_k);

        Ok(BacktestRun {
            prediction_date,
            validation_date,
            top_k,
            snapshot_date: snapshot.date,
            candidates_considered,
            predictions,
        })
    }
}

/// Resolve, validate, and score every entity the snapshot mentions.
fn replay_candidates(
    registry: &Registry,
    snapshot: &SourceSnapshot,
    prediction_date: NaiveDate,
) -> Vec<(String, ValidationResult, (f64, Recommendation))> {
    // Entity -> records, attributed through the tiered matcher.
    let mut entity_records: BTreeMap<String, Vec<&SignalRecord>> = BTreeMap::new();
    let mut best_resolution = BTreeMap::new();

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
            let Some(primary) = &resolution.primary else {
                continue;
            };
            entity_records
                .entry(primary.entity_id.clone())
                .or_default()
                .push(record);
            let entry = best_resolution
                .entry(primary.entity_id.clone())
                .or_insert_with(|| resolution.clone());
            if resolution.confidence > entry.confidence {
                *entry = resolution;
            }
        }
    }

    let mut candidates = Vec::new();
    for (entity_id, records) in &entity_records {
        let Some(resolution) = best_resolution.get(entity_id) else {
            continue;
        };
        let Ok(validation) = validation::compute_validation(registry, resolution, snapshot) else {
            continue;
        };
        let assessment = score_from_records(entity_id, prediction_date, records);
        candidates.push((
            entity_id.clone(),
            validation,
            (assessment.conviction_score, assessment.recommendation),
        ));
    }
    candidates
}

/// Classify every prediction and every qualifying ground-truth event.
///
/// Invariants: each prediction is exactly one of {hit, false_positive};
/// each event with breakout on or before the validation date is exactly one
/// of {hit, miss}.
pub fn generate_scorecard(run: &BacktestRun, ground_truth: &[GroundTruthEvent]) -> Scorecard {
    let events_by_entity: BTreeMap<&str, &GroundTruthEvent> = ground_truth
        .iter()
        .map(|e| (e.entity_id.as_str(), e))
        .collect();

    let mut outcomes = Vec::new();
    let mut hits = 0usize;
    let mut lead_times = Vec::new();

    for prediction in &run.predictions {
        let event = events_by_entity.get(prediction.entity_id.as_str());
        let outcome = match event {
            Some(e) if e.breakout_date <= run.validation_date => PredictionOutcome::Hit,
            _ => PredictionOutcome::FalsePositive,
        };
        let lead_time_weeks = match (outcome, event) {
            (PredictionOutcome::Hit, Some(e)) => {
                let days = (e.breakout_date - run.prediction_date).num_days();
                if days > 0 {
                    Some(days as f64 / 7.0)
                } else {
                    None
                }
            }
            _ => None,
        };
        if outcome == PredictionOutcome::Hit {
            hits += 1;
            if let Some(weeks) = lead_time_weeks {
                lead_times.push(weeks);
            }
        }
        outcomes.push(ScoredPrediction {
            prediction: prediction.clone(),
            outcome,
            lead_time_weeks,
        });
    }

    let predicted: Vec<&str> = run.predictions.iter().map(|p| p.entity_id.as_str()).collect();
    let qualifying: Vec<&GroundTruthEvent> = ground_truth
        .iter()
        .filter(|e| e.breakout_date <= run.validation_date)
        .collect();
    let misses: Vec<String> = qualifying
        .iter()
        .filter(|e| !predicted.contains(&e.entity_id.as_str()))
        .map(|e| e.entity_id.clone())
        .collect();

    let false_positives = outcomes.len() - hits;
    let precision_at_k = if outcomes.is_empty() {
        0.0
    } else {
        hits as f64 / outcomes.len() as f64
    };
    let recall = if qualifying.is_empty() {
        0.0
    } else {
        hits as f64 / qualifying.len() as f64
    };
    let avg_lead_time_weeks = if lead_times.is_empty() {
        None
    } else {
        Some(lead_times.iter().sum::<f64>() / lead_times.len() as f64)
    };
    let miss_rate = if ground_truth.is_empty() {
        0.0
    } else {
        misses.len() as f64 / ground_truth.len() as f64
    };

    Scorecard {
        prediction_date: run.prediction_date,
        validation_date: run.validation_date,
        top_k: run.top_k,
        outcomes,
        misses,
        hits,
        false_positives,
        precision_at_k,
        recall,
        avg_lead_time_weeks,
        miss_rate,
    }
}
