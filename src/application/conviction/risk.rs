//! Risk assessment: the bear side of the adversarial synthesis.
//!
//! Classification comes first and sets the grading curve for everything
//! after it. The same silence reads differently per class: a SaaS business
//! hiding its pricing is a red flag, an OSS project without a pricing page
//! is just an OSS project.

use crate::domain::entities::conviction::{EntityClassification, RedFlag};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingModel {
    SelfServe,
    SalesOnly,
}

impl FromStr for PricingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "self_serve" | "self-serve" => Ok(PricingModel::SelfServe),
            "sales_only" | "sales-only" => Ok(PricingModel::SalesOnly),
            _ => Err(format!("Unknown pricing model: {s}")),
        }
    }
}

/// Commercial and safety evidence for one entity. Absence of a field is
/// itself a signal, interpreted per classification.
#[derive(Debug, Clone, Default)]
pub struct RiskEvidence {
    pub is_open_source: Option<bool>,
    pub has_saas_offering: Option<bool>,
    pub license: Option<String>,
    pub has_pricing_page: Option<bool>,
    pub pricing_model: Option<PricingModel>,
    pub last_commit_days: Option<u32>,
    pub last_release_days: Option<u32>,
    pub months_since_funding: Option<u32>,
    pub funding_total_usd: Option<f64>,
    pub paying_customers: Option<bool>,
    pub enterprise_logos: u32,
    pub breaches: u32,
    pub lawsuits: u32,
    pub layoffs: u32,
    pub founder_controversies: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub classification: EntityClassification,
    pub commercial_maturity_score: f64,
    pub brand_safety_score: f64,
    pub bear_thesis: String,
    pub red_flags: Vec<RedFlag>,
    pub missing_critical_signals: Vec<String>,
}

/// Development older than this with no self-serve access reads as vaporware.
const STALE_DEVELOPMENT_DAYS: u32 = 180;
/// Funding older than this without commercial traction reads as a runway
/// problem.
const STALE_FUNDING_MONTHS: u32 = 24;

pub fn assess(evidence: &RiskEvidence) -> RiskAssessment {
    let classification = classify(evidence);
    let mut maturity: f64 = 50.0;
    let mut red_flags = Vec::new();
    let mut missing = Vec::new();

    // Commercial traction adds.
    if evidence.pricing_model == Some(PricingModel::SelfServe)
        || evidence.has_pricing_page == Some(true)
    {
        maturity += 15.0;
    }
    if evidence.paying_customers == Some(true) {
        maturity += 15.0;
    }
    maturity += (evidence.enterprise_logos as f64 * 2.0).min(10.0);
    if evidence.months_since_funding.map(|m| m < 18).unwrap_or(false) {
        maturity += 10.0;
    }

    // Vaporware: stale development and no self-serve way in.
    let development_stale = evidence
        .last_commit_days
        .map(|d| d > STALE_DEVELOPMENT_DAYS)
        .unwrap_or(false);
    let self_serve_access = evidence.pricing_model == Some(PricingModel::SelfServe)
        || evidence
            .last_release_days
            .map(|d| d <= STALE_DEVELOPMENT_DAYS)
            .unwrap_or(false);
    if development_stale && !self_serve_access {
        maturity -= 20.0;
        red_flags.push(RedFlag {
            severity: 3,
            label: "vaporware_risk".into(),
            detail: format!(
                "no commits in {} days and no self-serve access",
                evidence.last_commit_days.unwrap_or(0)
            ),
        });
    }

    // Sustainability: old funding with nothing commercial to show for it.
    if let Some(months) = evidence.months_since_funding {
        if months > STALE_FUNDING_MONTHS && evidence.paying_customers != Some(true) {
            maturity -= 15.0;
            red_flags.push(RedFlag {
                severity: 2,
                label: "sustainability_risk".into(),
                detail: format!("last funding {months} months ago, no paying customers reported"),
            });
        }
    }

    // Sales-only pricing penalizes SaaS only; for OSS it is immaterial.
    if classification == EntityClassification::CommercialSaas
        && evidence.pricing_model == Some(PricingModel::SalesOnly)
    {
        maturity -= 10.0;
        red_flags.push(RedFlag {
            severity: 1,
            label: "sales_only_pricing".into(),
            detail: "no self-serve motion; adoption gated on a sales team".into(),
        });
    }

    // Silence-as-signal, graded per classification.
    match classification {
        EntityClassification::CommercialSaas => {
            if evidence.has_pricing_page.is_none() && evidence.pricing_model.is_none() {
                maturity -= 15.0;
                missing.push("pricing".to_string());
                red_flags.push(RedFlag {
                    severity: 2,
                    label: "missing_pricing".into(),
                    detail: "a commercial product with no discoverable pricing".into(),
                });
            }
            if evidence.months_since_funding.is_none() && evidence.funding_total_usd.is_none() {
                maturity -= 5.0;
                missing.push("funding_history".to_string());
            }
        }
        EntityClassification::OssProject => {
            if evidence.license.is_none() {
                maturity -= 5.0;
                missing.push("license".to_string());
            }
        }
    }
    if evidence.last_commit_days.is_none() {
        maturity -= 10.0;
        missing.push("development_activity".to_string());
    }

    let commercial_maturity_score = maturity.clamp(0.0, 100.0);

    // Brand safety: start clean, deduct per incident class, floor at 0.
    let mut safety: f64 = 100.0;
    for (count, deduction, severity, label) in [
        (evidence.breaches, 25.0, 5u8, "security_breach"),
        (evidence.lawsuits, 20.0, 4, "lawsuit"),
        (evidence.layoffs, 15.0, 3, "layoffs"),
        (evidence.founder_controversies, 10.0, 2, "founder_controversy"),
    ] {
        if count > 0 {
            safety -= deduction * count as f64;
            red_flags.push(RedFlag {
                severity,
                label: label.into(),
                detail: format!("{count} {label} event(s) on record"),
            });
        }
    }
    let brand_safety_score = safety.max(0.0);

    red_flags.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.label.cmp(&b.label)));

    let bear_thesis = if red_flags.is_empty() {
        format!(
            "No material risks on record; maturity {:.0}/100 for a {}.",
            commercial_maturity_score, classification
        )
    } else {
        let top: Vec<&str> = red_flags.iter().take(3).map(|f| f.detail.as_str()).collect();
        format!(
            "As a {}: {}. Maturity {:.0}/100, brand safety {:.0}/100.",
            classification,
            top.join("; "),
            commercial_maturity_score,
            brand_safety_score
        )
    };

    RiskAssessment {
        classification,
        commercial_maturity_score,
        brand_safety_score,
        bear_thesis,
        red_flags,
        missing_critical_signals: missing,
    }
}

/// OSS when openly licensed with no hosted commercial arm; SaaS when a
/// commercial offering or pricing surface exists. A bare license with
/// nothing else still reads OSS.
fn classify(evidence: &RiskEvidence) -> EntityClassification {
    if evidence.is_open_source == Some(true) && evidence.has_saas_offering != Some(true) {
        return EntityClassification::OssProject;
    }
    if evidence.has_saas_offering == Some(true)
        || evidence.has_pricing_page == Some(true)
        || evidence.pricing_model.is_some()
    {
        return EntityClassification::CommercialSaas;
    }
    if evidence.license.is_some() {
        EntityClassification::OssProject
    } else {
        EntityClassification::CommercialSaas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_source_without_saas_is_oss() {
        let evidence = RiskEvidence {
            is_open_source: Some(true),
            ..Default::default()
        };
        assert_eq!(assess(&evidence).classification, EntityClassification::OssProject);
    }

    #[test]
    fn test_open_source_with_hosted_offering_is_saas() {
        let evidence = RiskEvidence {
            is_open_source: Some(true),
            has_saas_offering: Some(true),
            ..Default::default()
        };
        assert_eq!(
            assess(&evidence).classification,
            EntityClassification::CommercialSaas
        );
    }

    #[test]
    fn test_missing_pricing_severe_for_saas_immaterial_for_oss() {
        let saas = RiskEvidence {
            has_saas_offering: Some(true),
            last_commit_days: Some(10),
            ..Default::default()
        };
        let saas_result = assess(&saas);
        assert!(saas_result
            .missing_critical_signals
            .contains(&"pricing".to_string()));

        let oss = RiskEvidence {
            is_open_source: Some(true),
            license: Some("Apache-2.0".into()),
            last_commit_days: Some(10),
            ..Default::default()
        };
        let oss_result = assess(&oss);
        assert!(!oss_result
            .missing_critical_signals
            .contains(&"pricing".to_string()));
        assert!(oss_result.commercial_maturity_score > saas_result.commercial_maturity_score);
    }

    #[test]
    fn test_sales_only_pricing_penalizes_saas_not_oss() {
        let base_saas = RiskEvidence {
            has_saas_offering: Some(true),
            pricing_model: Some(PricingModel::SelfServe),
            last_commit_days: Some(10),
            ..Default::default()
        };
        let sales_saas = RiskEvidence {
            pricing_model: Some(PricingModel::SalesOnly),
            ..base_saas.clone()
        };
        assert!(
            assess(&sales_saas).commercial_maturity_score
                < assess(&base_saas).commercial_maturity_score
        );

        let oss = RiskEvidence {
            is_open_source: Some(true),
            license: Some("MIT".into()),
            pricing_model: Some(PricingModel::SalesOnly),
            last_commit_days: Some(10),
            ..Default::default()
        };
        assert!(!assess(&oss)
            .red_flags
            .iter()
            .any(|f| f.label == "sales_only_pricing"));
    }

    #[test]
    fn test_vaporware_needs_staleness_and_no_access() {
        let stale_no_access = RiskEvidence {
            last_commit_days: Some(300),
            ..Default::default()
        };
        assert!(assess(&stale_no_access)
            .red_flags
            .iter()
            .any(|f| f.label == "vaporware_risk"));

        let stale_but_shipping = RiskEvidence {
            last_commit_days: Some(300),
            last_release_days: Some(30),
            ..Default::default()
        };
        assert!(!assess(&stale_but_shipping)
            .red_flags
            .iter()
            .any(|f| f.label == "vaporware_risk"));
    }

    #[test]
    fn test_brand_safety_floors_at_zero() {
        let evidence = RiskEvidence {
            breaches: 3,
            lawsuits: 2,
            layoffs: 2,
            ..Default::default()
        };
        assert_eq!(assess(&evidence).brand_safety_score, 0.0);
    }

    #[test]
    fn test_red_flags_ranked_by_severity() {
        let evidence = RiskEvidence {
            breaches: 1,
            founder_controversies: 1,
            pricing_model: Some(PricingModel::SalesOnly),
            has_saas_offering: Some(true),
            last_commit_days: Some(10),
            ..Default::default()
        };
        let flags = assess(&evidence).red_flags;
        assert_eq!(flags.first().unwrap().label, "security_breach");
        let severities: Vec<u8> = flags.iter().map(|f| f.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
    }
}
