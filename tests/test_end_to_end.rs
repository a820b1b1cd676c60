//! End-to-end: snapshot build -> resolve -> validate -> score -> backtest,
//! plus registry hot-reload semantics along the way.

mod common;

use common::*;
use trendintel::domain::values::run_status::RunStatus;
use trendintel::infrastructure::config::AmbiguityRules;

#[tokio::test]
async fn test_full_chain_on_one_snapshot() {
    let ti = setup_with_feeds(
        test_config(),
        FakeFeed::new(
            "equities",
            vec![observation("AAA", 18.0), observation("BBB", -4.0)],
        ),
        FakeFeed::new("tokens", vec![observation("agentcoin", 9.0)]),
        FakeFeed::new("macro", vec![macro_observation("VIXCLS", Some(0.2))]),
    );
    let date = day(2025, 6, 2);

    // 1. Snapshot.
    let snapshot = ti.build_snapshot(date, &scenario_outputs(date)).unwrap();
    assert_eq!(snapshot.date, date);

    // 2. Resolve + validate.
    let scan = ti.resolve_entities(date).unwrap();
    assert!(scan
        .entities
        .iter()
        .any(|e| e.validation.entity_id == "deepseek" && e.validation.validated));

    // 3. Financial signals.
    let report = ti.refresh_signals(date, 7).await.unwrap();
    assert!(report.buckets.iter().any(|b| b.pms.is_some()));
    assert!((-1.0..=1.0).contains(&report.macro_regime.value));

    // 4. Conviction.
    let assessment = ti.score_conviction("deepseek", date).unwrap();
    assert!((0.0..=100.0).contains(&assessment.conviction_score));

    // 5. The stored assessment is retrievable under its composite key.
    let stored = ti.get_assessment("deepseek", date).unwrap().unwrap();
    assert_eq!(stored.conviction_score, assessment.conviction_score);
}

#[test]
fn test_registry_reload_is_versioned_and_atomic() {
    let ti = setup();
    assert_eq!(ti.registry_version(), 1);

    // Resolves against v1.
    assert!(ti.resolve_name("DeepSeek", None, "").is_resolved());

    // Swap in a registry without deepseek.
    let version = ti
        .reload_registry(vec![mistral()], AmbiguityRules::default())
        .unwrap();
    assert_eq!(version, 2);
    assert!(!ti.resolve_name("DeepSeek", None, "").is_resolved());
    assert!(ti.resolve_name("Mistral", None, "paris llm").is_resolved());

    // A malformed reload is rejected and leaves the current version live.
    let mut broken = mistral();
    broken.id = "".into();
    assert!(ti
        .reload_registry(vec![broken], AmbiguityRules::default())
        .is_err());
    assert_eq!(ti.registry_version(), 2);
}

#[tokio::test]
async fn test_soft_failures_surface_never_silently() {
    let mut tokens = FakeFeed::new("tokens", vec![observation("agentcoin", 2.0)]);
    tokens.expected = 8;
    let ti = setup_with_feeds(
        test_config(),
        FakeFeed::empty("equities"),
        tokens,
        FakeFeed::empty("macro"),
    );

    let report = ti.refresh_signals(day(2025, 6, 2), 7).await.unwrap();
    assert_eq!(report.overall_status, RunStatus::Degraded);
    assert!(
        !report.warnings.is_empty(),
        "every soft failure must appear in warnings"
    );
}
