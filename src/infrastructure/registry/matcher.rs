//! Tiered entity matcher.
//!
//! Resolves a raw name string into a canonical entity with a confidence and
//! tier. Matching is a pure function of (raw name, registry version, nearby
//! context): no clock, no I/O, no hash-order iteration, so a backtest
//! replaying the same inputs reproduces the same resolution bit for bit.
//!
//! Tier ladder:
//! - Tier 1: exact canonical-name/alias lookup -> 1.0
//! - Tier 2: org/namespace prefix against a registered linked asset ->
//!   0.6 base plus bounded coherence boosts, capped at 0.9
//! - Tier 3: substring containment -> 0.2, subject to the ambiguity table

use crate::domain::entities::canonical_entity::CanonicalEntity;
use crate::domain::entities::resolution::{
    CandidateMatch, EntityResolution, ResolutionPath, RuleFiring,
};
use crate::domain::values::match_tier::MatchTier;
use crate::domain::values::source_category::SourceCategory;
use crate::infrastructure::registry::{normalize, Registry};

/// Base confidence for a namespace-prefix match.
const TIER2_BASE: f64 = 0.6;
/// Tier-2 confidence can never reach tier-1 territory.
const TIER2_CAP: f64 = 0.9;
/// Base confidence for a substring match.
const TIER3_BASE: f64 = 0.2;
/// Candidates below this floor leave the resolution unresolved.
const RESOLUTION_FLOOR: f64 = 0.2;
/// Substring matches on very short names are noise, not signal.
const MIN_SUBSTRING_LEN: usize = 3;

/// Tier-2 coherence rules, evaluated in order. Each is a named predicate
/// with a bounded confidence delta; fired rules are recorded in the
/// candidate's trace.
struct CoherenceRule {
    name: &'static str,
    delta: f64,
    applies: fn(&CanonicalEntity, &str, &str) -> bool,
}

const COHERENCE_RULES: &[CoherenceRule] = &[
    CoherenceRule {
        name: "website_crosslink",
        delta: 0.10,
        applies: |entity, _namespace, context| {
            entity
                .website
                .as_deref()
                .map(|w| {
                    let domain = w
                        .trim_start_matches("https://")
                        .trim_start_matches("http://")
                        .trim_start_matches("www.")
                        .trim_end_matches('/');
                    !domain.is_empty() && context.contains(&domain.to_lowercase())
                })
                .unwrap_or(false)
        },
    },
    CoherenceRule {
        name: "readme_name_mention",
        delta: 0.10,
        applies: |entity, _namespace, context| {
            context.contains(&normalize(&entity.canonical_name))
        },
    },
    CoherenceRule {
        name: "namespace_multi_source",
        delta: 0.10,
        applies: |entity, namespace, _context| entity.namespace_source_count(namespace) >= 2,
    },
    CoherenceRule {
        name: "product_mention",
        delta: 0.05,
        applies: |entity, _namespace, context| {
            entity
                .aliases
                .iter()
                .any(|alias| context.contains(&normalize(alias)))
        },
    },
];

/// Resolve a raw name against one registry version.
///
/// `source_category` steers which linked-asset types a tier-2 match
/// consults; an unrecognized category falls back to checking all of them
/// rather than failing. `context` is whatever text surrounded the mention.
pub fn resolve(
    registry: &Registry,
    raw_name: &str,
    source_category: Option<SourceCategory>,
    context: &str,
) -> EntityResolution {
    let raw_trimmed = raw_name.trim();
    let raw_norm = normalize(raw_name);
    let context_norm = normalize(context);

    if raw_norm.is_empty() {
        return EntityResolution::unresolved(raw_name, registry.version(), vec![]);
    }

    // Denylist patterns reject outright; no context can rescue them.
    for pattern in &registry.ambiguity().deny_patterns {
        if raw_norm.contains(&normalize(pattern)) {
            return EntityResolution::unresolved(
                raw_name,
                registry.version(),
                vec![format!("denylist:{pattern}")],
            );
        }
    }

    // Registry path: the raw name is itself an entity id.
    if let Some(entity) = registry.get(raw_trimmed) {
        let candidate = CandidateMatch {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type,
            tier: MatchTier::Tier1,
            confidence: 1.0,
            trace: vec![RuleFiring {
                rule: "registry_id".into(),
                delta: 1.0,
            }],
        };
        return build_resolution(raw_name, registry, vec![candidate], vec![], ResolutionPath::Registry);
    }

    // Tier 1: exact canonical-name or alias match.
    if let Some(entity_id) = registry.lookup_alias(&raw_norm) {
        let entity = registry.get(entity_id).expect("alias index points at entity");
        let candidate = CandidateMatch {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type,
            tier: MatchTier::Tier1,
            confidence: 1.0,
            trace: vec![RuleFiring {
                rule: "exact_alias".into(),
                delta: 1.0,
            }],
        };
        return build_resolution(raw_name, registry, vec![candidate], vec![], ResolutionPath::Tier1);
    }

    let mut candidates = Vec::new();
    let mut ambiguity_flags = Vec::new();

    // Tier 2: namespace prefix. "deepseek-ai/DeepSeek-V3" offers the
    // namespace "deepseek-ai"; a bare "deepseek-ai" offers itself.
    let namespace = raw_trimmed
        .split_once('/')
        .map(|(ns, _)| ns)
        .unwrap_or(raw_trimmed);
    let namespace_norm = normalize(namespace);

    for entity in registry.entities() {
        if !namespace_matches(entity, &namespace_norm, source_category) {
            continue;
        }
        let mut confidence = TIER2_BASE;
        let mut trace = vec![RuleFiring {
            rule: "namespace_prefix".into(),
            delta: TIER2_BASE,
        }];
        for rule in COHERENCE_RULES {
            if (rule.applies)(entity, &namespace_norm, &context_norm) {
                confidence += rule.delta;
                trace.push(RuleFiring {
                    rule: rule.name.into(),
                    delta: rule.delta,
                });
            }
        }
        if confidence > TIER2_CAP {
            confidence = TIER2_CAP;
        }
        candidates.push(CandidateMatch {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type,
            tier: MatchTier::Tier2,
            confidence,
            trace,
        });
    }

    // Tier 3: substring containment, gated by the ambiguity table.
    for entity in registry.entities() {
        if candidates.iter().any(|c| c.entity_id == entity.id) {
            continue;
        }
        let matched_term = entity.known_names().into_iter().find(|name| {
            let name_norm = normalize(name);
            name_norm.len() >= MIN_SUBSTRING_LEN && raw_norm.contains(&name_norm)
        });
        let Some(term) = matched_term else {
            continue;
        };
        if let Some(flag) = ambiguity_rejection(registry, term, &context_norm) {
            ambiguity_flags.push(flag);
            continue;
        }
        candidates.push(CandidateMatch {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type,
            tier: MatchTier::Tier3,
            confidence: TIER3_BASE,
            trace: vec![RuleFiring {
                rule: format!("substring:{}", normalize(term)),
                delta: TIER3_BASE,
            }],
        });
    }

    // Rank by confidence, entity id as the total tie-break.
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let path = match candidates.first() {
        Some(top) if top.confidence >= RESOLUTION_FLOOR => match top.tier {
            MatchTier::Tier1 => ResolutionPath::Tier1,
            MatchTier::Tier2 => ResolutionPath::Tier2,
            MatchTier::Tier3 => ResolutionPath::Tier3,
        },
        _ => ResolutionPath::Unresolved,
    };

    if path == ResolutionPath::Unresolved {
        let mut resolution = EntityResolution::unresolved(raw_name, registry.version(), ambiguity_flags);
        resolution.candidates = candidates;
        return resolution;
    }

    build_resolution(raw_name, registry, candidates, ambiguity_flags, path)
}

/// Whether the entity has `namespace` registered, restricted to the asset
/// types the source category vouches for. Unknown categories use the
/// generic check across all asset types.
fn namespace_matches(
    entity: &CanonicalEntity,
    namespace: &str,
    source_category: Option<SourceCategory>,
) -> bool {
    if namespace.is_empty() {
        return false;
    }
    let asset_types: Option<&[&str]> = match source_category {
        Some(SourceCategory::Technical) => {
            Some(&["github_org", "hf_namespace", "package_namespace"])
        }
        Some(SourceCategory::Financial) => Some(&["ticker", "token_symbol"]),
        Some(SourceCategory::Social) | Some(SourceCategory::Predictive) | None => None,
    };
    match asset_types {
        None => entity.owns_namespace(namespace),
        Some(types) => types.iter().any(|t| {
            entity
                .assets_of(t)
                .iter()
                .any(|id| id.eq_ignore_ascii_case(namespace))
        }),
    }
}

/// Denylist check for a tier-3 term: if the term is in the ambiguity table
/// and none of its required context keywords appear nearby, the candidate
/// is rejected outright.
fn ambiguity_rejection(registry: &Registry, term: &str, context_norm: &str) -> Option<String> {
    let term_norm = normalize(term);
    let rule = registry
        .ambiguity()
        .terms
        .iter()
        .find(|r| normalize(&r.term) == term_norm)?;
    let has_context = rule
        .context_keywords
        .iter()
        .any(|kw| context_norm.contains(&normalize(kw)));
    if has_context {
        None
    } else {
        Some(format!("ambiguous_term:{term_norm}"))
    }
}

fn build_resolution(
    raw_name: &str,
    registry: &Registry,
    candidates: Vec<CandidateMatch>,
    ambiguity_flags: Vec<String>,
    path: ResolutionPath,
) -> EntityResolution {
    let primary = candidates.first().cloned();
    let confidence = primary.as_ref().map(|c| c.confidence).unwrap_or(0.0);
    EntityResolution {
        raw_name: raw_name.to_string(),
        registry_version: registry.version(),
        primary,
        candidates,
        confidence,
        ambiguity_flags,
        path,
    }
}
