//! The arbiter: final stage of the adversarial synthesis.
//!
//! Takes the bull case and the bear case as given and reduces them to one
//! conviction score, a conflict measure, and a recommendation. Pure over
//! its inputs; the analysis date is supplied by the caller, never read from
//! a clock.

use crate::application::conviction::growth::GrowthAssessment;
use crate::application::conviction::risk::RiskAssessment;
use crate::domain::entities::conviction::{ConvictionAssessment, EntityClassification};
use crate::domain::values::recommendation::{ConflictIntensity, Recommendation};
use crate::domain::values::trend_shape::TrendShape;
use chrono::NaiveDate;

/// Technical-vs-commercial weights per grading curve.
const OSS_TECHNICAL_WEIGHT: f64 = 0.7;
const SAAS_TECHNICAL_WEIGHT: f64 = 0.5;
/// Awarded when the growth stage reports an exponential trend.
const MOMENTUM_BONUS: f64 = 10.0;
/// Scale of the brand-safety deduction; never positive.
const RISK_PENALTY_SCALE: f64 = 0.1;

pub fn synthesize(
    entity_id: &str,
    analysis_date: NaiveDate,
    growth: &GrowthAssessment,
    risk: &RiskAssessment,
) -> ConvictionAssessment {
    let technical = growth.technical_velocity_score;
    let commercial = risk.commercial_maturity_score;

    let technical_weight = match risk.classification {
        EntityClassification::OssProject => OSS_TECHNICAL_WEIGHT,
        EntityClassification::CommercialSaas => SAAS_TECHNICAL_WEIGHT,
    };
    let weighted_sum = technical_weight * technical + (1.0 - technical_weight) * commercial;

    let momentum_bonus = if growth.trend == TrendShape::Exponential {
        MOMENTUM_BONUS
    } else {
        0.0
    };
    let risk_penalty = (risk.brand_safety_score - 100.0) * RISK_PENALTY_SCALE;

    let conviction_score = (weighted_sum + momentum_bonus + risk_penalty).clamp(0.0, 100.0);
    let conflict_intensity = ConflictIntensity::from_gap(technical - commercial);
    let recommendation = Recommendation::decide(conviction_score, conflict_intensity);

    ConvictionAssessment {
        entity_id: entity_id.to_string(),
        analysis_date,
        classification: risk.classification,
        technical_velocity_score: technical,
        commercial_maturity_score: commercial,
        brand_safety_score: risk.brand_safety_score,
        conviction_score,
        conflict_intensity,
        recommendation,
        bull_thesis: growth.bull_thesis.clone(),
        bear_thesis: risk.bear_thesis.clone(),
        red_flags: risk.red_flags.clone(),
        missing_critical_signals: risk.missing_critical_signals.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growth(score: f64, trend: TrendShape) -> GrowthAssessment {
        GrowthAssessment {
            technical_velocity_score: score,
            trend,
            bull_thesis: "bull".into(),
            signals_used: vec![],
        }
    }

    fn risk(
        classification: EntityClassification,
        commercial: f64,
        brand_safety: f64,
    ) -> RiskAssessment {
        RiskAssessment {
            classification,
            commercial_maturity_score: commercial,
            brand_safety_score: brand_safety,
            bear_thesis: "bear".into(),
            red_flags: vec![],
            missing_critical_signals: vec![],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_oss_exponential_high_gap_alerts() {
        // technical 95, commercial 40, exponential, brand safety 80:
        // 0.7*95 + 0.3*40 + 10 + (80-100)*0.1 = 66.5 + 12 + 10 - 2 = 86.5
        let assessment = synthesize(
            "proj",
            date(),
            &growth(95.0, TrendShape::Exponential),
            &risk(EntityClassification::OssProject, 40.0, 80.0),
        );
        assert!((assessment.conviction_score - 86.5).abs() < 1e-9);
        assert_eq!(assessment.conflict_intensity, ConflictIntensity::High);
        assert_eq!(assessment.recommendation, Recommendation::Alert);
    }

    #[test]
    fn test_saas_weights_are_even() {
        let assessment = synthesize(
            "corp",
            date(),
            &growth(80.0, TrendShape::Linear),
            &risk(EntityClassification::CommercialSaas, 40.0, 100.0),
        );
        // 0.5*80 + 0.5*40 = 60, no bonus, no penalty.
        assert!((assessment.conviction_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_penalty_never_positive() {
        let clean = synthesize(
            "x",
            date(),
            &growth(50.0, TrendShape::Flat),
            &risk(EntityClassification::OssProject, 50.0, 100.0),
        );
        let damaged = synthesize(
            "x",
            date(),
            &growth(50.0, TrendShape::Flat),
            &risk(EntityClassification::OssProject, 50.0, 0.0),
        );
        assert!((clean.conviction_score - 50.0).abs() < 1e-9);
        assert!((damaged.conviction_score - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_conviction_clipped_to_range() {
        let low = synthesize(
            "x",
            date(),
            &growth(0.0, TrendShape::Declining),
            &risk(EntityClassification::CommercialSaas, 0.0, 0.0),
        );
        assert_eq!(low.conviction_score, 0.0);

        let high = synthesize(
            "x",
            date(),
            &growth(100.0, TrendShape::Exponential),
            &risk(EntityClassification::OssProject, 100.0, 100.0),
        );
        assert_eq!(high.conviction_score, 100.0);
    }

    #[test]
    fn test_high_conflict_without_alert_investigates() {
        let assessment = synthesize(
            "x",
            date(),
            &growth(90.0, TrendShape::Linear),
            &risk(EntityClassification::CommercialSaas, 30.0, 100.0),
        );
        // 0.5*90 + 0.5*30 = 60; gap 60 -> HIGH -> INVESTIGATE.
        assert_eq!(assessment.conflict_intensity, ConflictIntensity::High);
        assert_eq!(assessment.recommendation, Recommendation::Investigate);
    }
}
