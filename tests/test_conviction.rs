//! Tests for conviction scoring through the facade: classification-driven
//! grading, recommendation precedence, and append-only storage.

mod common;

use common::*;
use trendintel::domain::entities::conviction::EntityClassification;
use trendintel::domain::error::DomainError;
use trendintel::domain::values::recommendation::Recommendation;
use trendintel::domain::values::source_category::SourceCategory;

#[test]
fn test_oss_project_with_exponential_growth_alerts() {
    let ti = setup();
    let date = day(2025, 6, 2);
    ti.build_snapshot(date, &scenario_outputs(date)).unwrap();

    let assessment = ti.score_conviction("deepseek", date).unwrap();
    assert_eq!(assessment.classification, EntityClassification::OssProject);
    assert!(assessment.technical_velocity_score > 70.0);
    assert!((0.0..=100.0).contains(&assessment.conviction_score));
    assert!(!assessment.bull_thesis.is_empty());
    assert!(!assessment.bear_thesis.is_empty());
}

#[test]
fn test_scoring_unknown_entity_is_not_found() {
    let ti = setup();
    let date = day(2025, 6, 2);
    ti.build_snapshot(date, &scenario_outputs(date)).unwrap();
    let result = ti.score_conviction("nonexistent", date);
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[test]
fn test_scoring_without_snapshot_is_no_snapshot() {
    let ti = setup();
    let result = ti.score_conviction("deepseek", day(2025, 6, 2));
    assert!(matches!(result, Err(DomainError::NoSnapshot(_))));
}

#[test]
fn test_assessments_are_append_only() {
    let ti = setup();
    let date = day(2025, 6, 2);
    ti.build_snapshot(date, &scenario_outputs(date)).unwrap();

    let first = ti.score_conviction("deepseek", date).unwrap();

    // Rebuild the snapshot with very different evidence for the same date.
    let mut outputs = scenario_outputs(date);
    outputs[0].records[0].payload = serde_json::json!({
        "stars": 100,
        "star_growth_pct_4w": -10.0,
        "is_open_source": true,
        "license": "MIT",
        "last_commit_days": 400,
    });
    ti.build_snapshot(date, &outputs).unwrap();

    // Re-scoring the same (entity, date) returns the stored assessment
    // unchanged instead of overwriting it.
    let second = ti.score_conviction("deepseek", date).unwrap();
    assert_eq!(first.conviction_score, second.conviction_score);
    assert_eq!(first.recommendation, second.recommendation);
    assert_eq!(
        ti.get_assessment("deepseek", date).unwrap().unwrap().conviction_score,
        first.conviction_score
    );
}

#[test]
fn test_saas_classification_changes_the_curve() {
    let ti = setup();
    let date = day(2025, 6, 2);

    // Mistral shows up as a commercial offering with no visible pricing.
    let mut outputs = scenario_outputs(date);
    outputs[0].records.push(record(
        "mistralai/platform",
        at(date, 6),
        serde_json::json!({
            "stars": 9000,
            "star_growth_pct_4w": 20.0,
            "has_saas_offering": true,
            "last_commit_days": 5,
        }),
    ));
    ti.build_snapshot(date, &outputs).unwrap();

    let assessment = ti.score_conviction("mistral", date).unwrap();
    assert_eq!(assessment.classification, EntityClassification::CommercialSaas);
    assert!(assessment
        .missing_critical_signals
        .contains(&"pricing".to_string()));
}

#[test]
fn test_recommendation_is_deterministic_over_same_inputs() {
    let date = day(2025, 6, 2);

    let run = || {
        let ti = setup();
        ti.build_snapshot(date, &scenario_outputs(date)).unwrap();
        ti.score_conviction("deepseek", date).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.conviction_score, b.conviction_score);
    assert_eq!(a.conflict_intensity, b.conflict_intensity);
    assert_eq!(a.recommendation, b.recommendation);
}

#[test]
fn test_high_conviction_beats_investigate() {
    // Exercised end-to-end in unit tests of the arbiter; here we pin the
    // precedence on whatever the scenario snapshot produces.
    let ti = setup();
    let date = day(2025, 6, 2);
    ti.build_snapshot(date, &scenario_outputs(date)).unwrap();
    let assessment = ti.score_conviction("deepseek", date).unwrap();

    if assessment.conviction_score > 80.0 {
        assert_eq!(assessment.recommendation, Recommendation::Alert);
    } else if assessment.conflict_intensity
        == trendintel::domain::values::recommendation::ConflictIntensity::High
    {
        assert_eq!(assessment.recommendation, Recommendation::Investigate);
    }
}

#[test]
fn test_resolution_feeds_scoring_only_matching_records() {
    let ti = setup();
    let date = day(2025, 6, 2);

    // A mistral record with inflammatory safety fields must not leak into
    // deepseek's assessment.
    let mut outputs = scenario_outputs(date);
    outputs[0].records.push(record(
        "mistralai/platform",
        at(date, 6),
        serde_json::json!({
            "breaches": 3,
            "lawsuits": 2,
            "is_open_source": true,
            "license": "Apache-2.0",
            "last_commit_days": 5,
        }),
    ));
    ti.build_snapshot(date, &outputs).unwrap();

    let deepseek = ti.score_conviction("deepseek", date).unwrap();
    assert_eq!(deepseek.brand_safety_score, 100.0);

    let mistral = ti
        .resolve_name("mistralai/platform", Some(SourceCategory::Technical), "")
        .primary
        .unwrap();
    assert_eq!(mistral.entity_id, "mistral");
}
