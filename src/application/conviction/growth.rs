//! Growth assessment: the bull side of the adversarial synthesis.
//!
//! Reads momentum-side evidence exclusively (adoption, velocity, mention
//! volume) and produces a technical velocity score plus the bull thesis.
//! Risk evidence never enters here; the arbiter is where the two sides
//! meet.

use crate::domain::values::trend_shape::TrendShape;
use serde::Serialize;

/// Momentum-side evidence for one entity, extracted from the snapshot.
/// Absent fields stay `None`; the score is computed over what is present.
#[derive(Debug, Clone, Default)]
pub struct GrowthEvidence {
    pub stars: Option<u64>,
    pub star_growth_pct_4w: Option<f64>,
    pub forks: Option<u64>,
    pub downloads_30d: Option<u64>,
    pub download_growth_pct_30d: Option<f64>,
    /// Mention counts per week, oldest first.
    pub weekly_mentions: Vec<u64>,
    /// Normalized social engagement, 0-100.
    pub social_engagement: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthAssessment {
    pub technical_velocity_score: f64,
    pub trend: TrendShape,
    pub bull_thesis: String,
    /// Which evidence components actually entered the score.
    pub signals_used: Vec<String>,
}

/// Component weights; renormalized over whichever components are present.
const WEIGHT_STARS: f64 = 0.35;
const WEIGHT_DOWNLOADS: f64 = 0.25;
const WEIGHT_MENTIONS: f64 = 0.25;
const WEIGHT_ENGAGEMENT: f64 = 0.15;

/// Week-over-week mention ratio above this, sustained, reads exponential.
const EXPONENTIAL_RATIO: f64 = 1.8;
/// 4-week star growth above this reads exponential on its own.
const EXPONENTIAL_STAR_GROWTH: f64 = 50.0;

pub fn assess(evidence: &GrowthEvidence) -> GrowthAssessment {
    let mut components: Vec<(&str, f64, f64)> = Vec::new();

    if let Some(growth) = evidence.star_growth_pct_4w {
        components.push(("star_velocity", WEIGHT_STARS, growth_to_score(growth)));
    }
    if let Some(growth) = evidence.download_growth_pct_30d {
        components.push(("download_growth", WEIGHT_DOWNLOADS, growth_to_score(growth)));
    }
    if let Some(ratio) = mention_momentum(&evidence.weekly_mentions) {
        let score = (50.0 + 25.0 * (ratio - 1.0)).clamp(0.0, 100.0);
        components.push(("mention_momentum", WEIGHT_MENTIONS, score));
    }
    if let Some(engagement) = evidence.social_engagement {
        components.push(("social_engagement", WEIGHT_ENGAGEMENT, engagement.clamp(0.0, 100.0)));
    }

    let weight_total: f64 = components.iter().map(|(_, w, _)| w).sum();
    let technical_velocity_score = if weight_total > 0.0 {
        components.iter().map(|(_, w, s)| w * s).sum::<f64>() / weight_total
    } else {
        0.0
    };

    let trend = classify_trend(evidence);
    let signals_used: Vec<String> = components.iter().map(|(n, _, _)| n.to_string()).collect();
    let bull_thesis = build_thesis(evidence, &components, trend, technical_velocity_score);

    GrowthAssessment {
        technical_velocity_score,
        trend,
        bull_thesis,
        signals_used,
    }
}

/// Map a percentage growth figure onto 0-100: flat sits at 40, +20% at 70,
/// +40% and beyond saturate.
fn growth_to_score(growth_pct: f64) -> f64 {
    (40.0 + 1.5 * growth_pct).clamp(0.0, 100.0)
}

/// Latest week's mentions vs the mean of the preceding weeks. Needs at
/// least two weeks of history.
fn mention_momentum(weekly: &[u64]) -> Option<f64> {
    if weekly.len() < 2 {
        return None;
    }
    let latest = *weekly.last()? as f64;
    let prior = &weekly[..weekly.len() - 1];
    let prior_mean = prior.iter().sum::<u64>() as f64 / prior.len() as f64;
    if prior_mean <= 0.0 {
        return if latest > 0.0 { Some(3.0) } else { None };
    }
    Some(latest / prior_mean)
}

fn classify_trend(evidence: &GrowthEvidence) -> TrendShape {
    let weekly = &evidence.weekly_mentions;
    if weekly.len() >= 3 {
        let n = weekly.len();
        let last = weekly[n - 1] as f64;
        let prev = weekly[n - 2] as f64;
        let before = weekly[n - 3] as f64;
        if prev > 0.0 && before > 0.0 {
            if last / prev >= EXPONENTIAL_RATIO && prev / before >= 1.5 {
                return TrendShape::Exponential;
            }
        }
        let peak = weekly[..n - 1].iter().copied().max().unwrap_or(0) as f64;
        if peak > 0.0 && last < 0.6 * peak {
            return TrendShape::Declining;
        }
    }
    if evidence.star_growth_pct_4w.unwrap_or(0.0) >= EXPONENTIAL_STAR_GROWTH {
        return TrendShape::Exponential;
    }
    let growth = evidence
        .star_growth_pct_4w
        .or(evidence.download_growth_pct_30d)
        .unwrap_or(0.0);
    if growth.abs() < 5.0 {
        TrendShape::Flat
    } else if growth < 0.0 {
        TrendShape::Declining
    } else {
        TrendShape::Linear
    }
}

fn build_thesis(
    evidence: &GrowthEvidence,
    components: &[(&str, f64, f64)],
    trend: TrendShape,
    score: f64,
) -> String {
    if components.is_empty() {
        return "No adoption evidence available; nothing to build a bull case on.".into();
    }
    let mut parts = Vec::new();
    if let Some(growth) = evidence.star_growth_pct_4w {
        let stars = evidence
            .stars
            .map(|s| format!("{s} stars"))
            .unwrap_or_else(|| "star count".into());
        parts.push(format!("{stars} growing {growth:+.0}% over 4 weeks"));
    }
    if let Some(growth) = evidence.download_growth_pct_30d {
        parts.push(format!("downloads {growth:+.0}% over 30 days"));
    }
    if let Some(ratio) = mention_momentum(&evidence.weekly_mentions) {
        parts.push(format!("mention volume at {ratio:.1}x its trailing average"));
    }
    format!(
        "{} adoption curve ({}); velocity {:.0}/100.",
        match trend {
            TrendShape::Exponential => "Exponential",
            TrendShape::Linear => "Steady",
            TrendShape::Flat => "Flat",
            TrendShape::Declining => "Declining",
        },
        parts.join(", "),
        score
    )
}
